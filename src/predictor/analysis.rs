//! History analysis - dry-run replay of the signal detector
//!
//! Nothing here registers predictions or touches mode counters.

use serde::Serialize;
use std::collections::BTreeMap;

use super::card::{Card, Rank};
use super::history::DrawHistory;
use super::signal::{classify, Signal};
use super::strategy::{resolve, RuleId};

/// Cycles shown when rendering a report
const RENDERED_CYCLES: usize = 10;

/// What the detector would have done on one stored draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisEntry {
    pub game_number: u64,
    pub signal: Signal,
    pub rule_id: RuleId,
    pub label: &'static str,
    pub target_game_number: u64,
    /// `Some(hit)` when the target draw is stored
    pub outcome: Option<bool>,
}

/// A Queen at game N preceded by a Queen-free draw at N-2
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueenCycle {
    pub game_number: u64,
    pub trigger_game_number: u64,
    pub trigger_cards: String,
    pub queen: Card,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub draws_examined: usize,
    pub entries: Vec<AnalysisEntry>,
    pub cycles: Vec<QueenCycle>,
}

impl AnalysisReport {
    /// Entries whose target draw is known
    pub fn evaluated(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_some()).count()
    }

    pub fn hits(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome == Some(true)).count()
    }

    /// Entry count per signal
    pub fn by_signal(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.signal.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Plain-text report for the admin chat
    pub fn render(&self) -> String {
        let mut lines = vec![
            "🔍 HISTORY ANALYSIS".to_string(),
            format!("Draws examined: {}", self.draws_examined),
            format!(
                "Signals: {} ({} verifiable, {} hits)",
                self.entries.len(),
                self.evaluated(),
                self.hits()
            ),
        ];

        for (signal, count) in self.by_signal() {
            lines.push(format!("  • {}: {}", signal, count));
        }

        if self.cycles.is_empty() {
            lines.push(String::new());
            lines.push("No Queen cycle (N-2 → N) found yet.".to_string());
        } else {
            lines.push(String::new());
            lines.push(format!("{} Queen cycle(s) (N-2 → N):", self.cycles.len()));
            let skip = self.cycles.len().saturating_sub(RENDERED_CYCLES);
            for cycle in self.cycles.iter().skip(skip) {
                lines.push(format!(
                    "#{} ← trigger #{} ({}) card {}",
                    cycle.game_number, cycle.trigger_game_number, cycle.trigger_cards, cycle.queen
                ));
            }
        }

        lines.join("\n")
    }
}

/// Re-run the detector over every stored draw
pub fn analyze(history: &DrawHistory) -> AnalysisReport {
    let mut report = AnalysisReport {
        draws_examined: history.len(),
        ..Default::default()
    };

    for draw in history.iter() {
        let signal = classify(&draw.cards);
        let rule = resolve(signal);
        let target = rule.and_then(|r| draw.game_number.checked_add(r.target_offset));
        if let (Some(signal), Some(rule), Some(target_game_number)) = (signal, rule, target) {
            report.entries.push(AnalysisEntry {
                game_number: draw.game_number,
                signal,
                rule_id: rule.id,
                label: rule.label,
                target_game_number,
                outcome: history.get(target_game_number).ok().map(|t| t.has_queen()),
            });
        }

        let queen = draw.cards.iter().find(|c| c.rank == Rank::Queen);
        if let (Some(queen), Some(before)) = (queen, draw.game_number.checked_sub(2)) {
            if let Ok(trigger) = history.get(before) {
                if !trigger.has_queen() {
                    report.cycles.push(QueenCycle {
                        game_number: draw.game_number,
                        trigger_game_number: before,
                        trigger_cards: trigger.leading_cards(),
                        queen: *queen,
                    });
                }
            }
        }
    }

    report
}
