//! Prediction Lifecycle Manager
//!
//! Holds at most one pending prediction per target game number, verifies
//! them against incoming draws and feeds each outcome to the mode controller.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

use super::error::{PredictorError, Result};
use super::history::DrawRecord;
use super::mode::{ModeController, ModeTransition};
use super::strategy::{Rule, RuleId};

/// Resolved predictions kept for inspection
const DEFAULT_ARCHIVE_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionStatus {
    Pending,
    Success,
    Failure,
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionStatus::Pending => write!(f, "PENDING"),
            PredictionStatus::Success => write!(f, "SUCCESS"),
            PredictionStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// A forecast that a Queen appears in `target_game_number`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPrediction {
    pub source_game_number: u64,
    pub target_game_number: u64,
    pub rule_id: RuleId,
    pub label: &'static str,
    pub status: PredictionStatus,
    /// Game number of the draw that settled the prediction
    pub resolved_by: Option<u64>,
}

impl PendingPrediction {
    /// Settled by a later draw because the target was never observed
    pub fn expired(&self) -> bool {
        matches!(self.resolved_by, Some(game) if game != self.target_game_number)
    }
}

/// Outcome of one prediction, with the mode change it triggered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub prediction: PendingPrediction,
    pub transition: Option<ModeTransition>,
}

#[derive(Debug)]
pub struct PredictionBook {
    pending: BTreeMap<u64, PendingPrediction>,
    archive: VecDeque<PendingPrediction>,
    archive_limit: usize,
    last_registered: Option<PendingPrediction>,
}

impl PredictionBook {
    pub fn new() -> Self {
        Self::with_archive_limit(DEFAULT_ARCHIVE_LIMIT)
    }

    pub fn with_archive_limit(archive_limit: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            archive: VecDeque::new(),
            archive_limit,
            last_registered: None,
        }
    }

    /// Register a prediction triggered by `draw`
    ///
    /// Rejected when a pending prediction already holds the target slot.
    pub fn register(&mut self, draw: &DrawRecord, rule: &Rule) -> Result<PendingPrediction> {
        let target_game_number = draw
            .game_number
            .checked_add(rule.target_offset)
            .ok_or(PredictorError::TargetOutOfRange { game_number: draw.game_number })?;

        if self.pending.contains_key(&target_game_number) {
            warn!(
                "Rule {} from #{} rejected: game #{} already has a pending prediction",
                rule.id, draw.game_number, target_game_number
            );
            return Err(PredictorError::RegistrationConflict { target_game_number });
        }

        let prediction = PendingPrediction {
            source_game_number: draw.game_number,
            target_game_number,
            rule_id: rule.id,
            label: rule.label,
            status: PredictionStatus::Pending,
            resolved_by: None,
        };

        info!(
            "Prediction registered: #{} -> Queen at #{} ({}, {})",
            draw.game_number, target_game_number, rule.id, rule.label
        );
        self.pending.insert(target_game_number, prediction.clone());
        self.last_registered = Some(prediction.clone());
        Ok(prediction)
    }

    /// Settle every pending prediction due at or before `draw`
    ///
    /// Targets skipped by the stream fail first, in target order; then the
    /// prediction targeting this exact draw succeeds iff it holds a Queen.
    pub fn on_draw(&mut self, draw: &DrawRecord, mode: &mut ModeController) -> Vec<Resolution> {
        let later = match draw.game_number.checked_add(1) {
            Some(next) => self.pending.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.pending, later);

        due.into_values()
            .map(|mut prediction| {
                let success = prediction.target_game_number == draw.game_number && draw.has_queen();
                prediction.status = if success {
                    PredictionStatus::Success
                } else {
                    PredictionStatus::Failure
                };
                prediction.resolved_by = Some(draw.game_number);

                if prediction.expired() {
                    debug!(
                        "Target #{} never observed, expired by #{}",
                        prediction.target_game_number, draw.game_number
                    );
                }
                info!(
                    "Prediction for #{} resolved: {}",
                    prediction.target_game_number, prediction.status
                );

                let transition = mode.record_outcome(success);
                self.retire(prediction.clone());
                Resolution { prediction, transition }
            })
            .collect()
    }

    fn retire(&mut self, prediction: PendingPrediction) {
        self.archive.push_back(prediction);
        while self.archive_limit > 0 && self.archive.len() > self.archive_limit {
            self.archive.pop_front();
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingPrediction> {
        self.pending.values()
    }

    pub fn pending_for(&self, target_game_number: u64) -> Option<&PendingPrediction> {
        self.pending.get(&target_game_number)
    }

    pub fn resolved(&self) -> impl Iterator<Item = &PendingPrediction> {
        self.archive.iter()
    }

    pub fn last_registered(&self) -> Option<&PendingPrediction> {
        self.last_registered.as_ref()
    }
}

impl Default for PredictionBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::history::DrawHistory;
    use crate::predictor::signal::Signal;
    use crate::predictor::strategy::resolve;

    fn record(history: &mut DrawHistory, text: &str) -> DrawRecord {
        history.append_raw(text).unwrap().clone()
    }

    #[test]
    fn test_conflicting_targets_keep_one_entry() {
        let mut history = DrawHistory::new(0);
        let mut book = PredictionBook::new();

        let nine = record(&mut history, "#N9. (K♠️5♥️)");
        let ten = record(&mut history, "#N10. (J♠️5♥️)");

        let king_alone = resolve(Some(Signal::KingAlone)).unwrap();
        let jack_alone = resolve(Some(Signal::JackAlone)).unwrap();

        let first = book.register(&nine, king_alone).unwrap();
        assert_eq!(first.target_game_number, 12);

        let second = book.register(&ten, jack_alone);
        assert_eq!(second, Err(PredictorError::RegistrationConflict { target_game_number: 12 }));

        assert_eq!(book.pending().count(), 1);
        assert_eq!(book.pending_for(12).unwrap().rule_id, RuleId::QNextDraw);
    }

    #[test]
    fn test_verification_on_exact_target() {
        let mut history = DrawHistory::new(0);
        let mut book = PredictionBook::new();
        let mut mode = ModeController::default();

        let ten = record(&mut history, "#N10. (J♠️5♥️)");
        book.register(&ten, resolve(Some(Signal::JackAlone)).unwrap()).unwrap();

        let eleven = record(&mut history, "#N11. (Q♠️5♥️)");
        assert!(book.on_draw(&eleven, &mut mode).is_empty());

        let twelve = record(&mut history, "#N12. (Q♦️2♥️)");
        let resolved = book.on_draw(&twelve, &mut mode);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].prediction.status, PredictionStatus::Success);
        assert!(!resolved[0].prediction.expired());
        assert_eq!(book.pending().count(), 0);
        assert_eq!(book.resolved().count(), 1);
    }

    #[test]
    fn test_skipped_target_expires_as_failure() {
        let mut history = DrawHistory::new(0);
        let mut book = PredictionBook::new();
        let mut mode = ModeController::default();

        let ten = record(&mut history, "#N10. (J♠️5♥️)");
        book.register(&ten, resolve(Some(Signal::JackAlone)).unwrap()).unwrap();

        let thirteen = record(&mut history, "#N13. (Q♠️Q♥️)");
        let resolved = book.on_draw(&thirteen, &mut mode);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].prediction.status, PredictionStatus::Failure);
        assert!(resolved[0].prediction.expired());
        assert_eq!(mode.state().consecutive_failures, 1);
    }

    #[test]
    fn test_multiple_due_resolve_in_target_order() {
        let mut history = DrawHistory::new(0);
        let mut book = PredictionBook::new();
        let mut mode = ModeController::default();

        let ten = record(&mut history, "#N10. (K♠️5♥️)");
        let eleven = record(&mut history, "#N11. (K♣️5♥️)");
        let king_alone = resolve(Some(Signal::KingAlone)).unwrap();
        book.register(&ten, king_alone).unwrap();
        book.register(&eleven, king_alone).unwrap();

        let fourteen = record(&mut history, "#N14. (7♠️)");
        let resolved = book.on_draw(&fourteen, &mut mode);
        let targets: Vec<u64> = resolved.iter().map(|r| r.prediction.target_game_number).collect();
        assert_eq!(targets, vec![13, 14]);
        assert_eq!(resolved[1].transition, Some(ModeTransition::Escalated { consecutive_failures: 2 }));
    }

    #[test]
    fn test_archive_is_bounded() {
        let mut history = DrawHistory::new(0);
        let mut book = PredictionBook::with_archive_limit(1);
        let mut mode = ModeController::new(100);
        let rule = resolve(Some(Signal::JackAlone)).unwrap();

        for n in [1u64, 4, 7] {
            let draw = record(&mut history, &format!("#N{}. (J♠️)", n));
            book.on_draw(&draw, &mut mode);
            book.register(&draw, rule).unwrap();
        }
        let last = record(&mut history, "#N20. (5♠️)");
        book.on_draw(&last, &mut mode);

        assert_eq!(book.resolved().count(), 1);
        assert_eq!(book.resolved().next().unwrap().target_game_number, 9);
    }

    #[test]
    fn test_largest_game_numbers_do_not_overflow() {
        let mut book = PredictionBook::new();
        let mut mode = ModeController::default();
        let draw = |game_number| DrawRecord {
            game_number,
            cards: Vec::new(),
            recorded_at: chrono::Utc::now(),
        };

        let near_end = draw(u64::MAX - 3);
        book.register(&near_end, resolve(Some(Signal::KingAlone)).unwrap()).unwrap();

        let last = draw(u64::MAX);
        assert_eq!(
            book.register(&last, resolve(Some(Signal::JackAlone)).unwrap()),
            Err(PredictorError::TargetOutOfRange { game_number: u64::MAX })
        );

        let resolved = book.on_draw(&last, &mut mode);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].prediction.target_game_number, u64::MAX);
        assert_eq!(resolved[0].prediction.status, PredictionStatus::Failure);
        assert_eq!(book.pending().count(), 0);
    }
}
