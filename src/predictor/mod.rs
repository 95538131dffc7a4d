//! Prediction core
//!
//! Watches the draw stream, announces Queen predictions and verifies them.
//!
//! - `card`: draw text parsing
//! - `history`: append-only draw store
//! - `signal` / `strategy`: pure classification and rule lookup
//! - `lifecycle`: pending predictions and their verification
//! - `mode`: DEFAULT/INTELLIGENT controller
//! - `analysis`: dry-run replay over stored history
//!
//! [`Predictor`] owns the store, the prediction book and the mode controller
//! together. Callers share it behind one lock ([`SharedPredictor`]) and send
//! the returned [`Outbound`] items only after releasing it.

pub mod analysis;
pub mod card;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod mode;
pub mod signal;
pub mod strategy;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::PredictorConfig;

pub use analysis::{AnalysisEntry, AnalysisReport, QueenCycle};
pub use card::{Card, ParsedDraw, Rank, Suit};
pub use error::{ParseError, PredictorError, Result};
pub use history::{DrawHistory, DrawRecord};
pub use lifecycle::{PendingPrediction, PredictionBook, PredictionStatus, Resolution};
pub use mode::{Mode, ModeController, ModeState, ModeTransition};
pub use signal::{classify, Signal};
pub use strategy::{resolve, Rule, RuleId};

/// Predictor shared between the listener, commands and the status server
pub type SharedPredictor = Arc<Mutex<Predictor>>;

/// Notification produced by the core, delivered by the messaging layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    Prediction {
        target_game_number: u64,
        rule_id: RuleId,
        label: &'static str,
    },
    Verdict {
        target_game_number: u64,
        status: PredictionStatus,
    },
    Alert {
        text: String,
    },
}

/// Everything one accepted draw caused
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub record: DrawRecord,
    /// Signal found, `None` when NONE or when the detector did not run
    pub signal: Option<Signal>,
    pub registered: Option<PendingPrediction>,
    pub resolutions: Vec<Resolution>,
    pub outbound: Vec<Outbound>,
}

/// Status snapshot for `/status` and the HTTP API
#[derive(Debug, Clone, Serialize)]
pub struct PredictorStatus {
    pub mode: Mode,
    pub intelligent_mode: bool,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub total_predictions: u64,
    pub total_successes: u64,
    pub draws_recorded: usize,
    pub last_game_number: Option<u64>,
    pub pending: Vec<PendingPrediction>,
    pub last_prediction: Option<PendingPrediction>,
}

impl PredictorStatus {
    pub fn render(&self) -> String {
        let mode = if self.intelligent_mode {
            "🟢 ACTIVE (rules applied)"
        } else {
            "🔴 INACTIVE (standby)"
        };
        let last = self
            .last_prediction
            .as_ref()
            .map(|p| format!("#{} ({}, {})", p.target_game_number, p.rule_id, p.label))
            .unwrap_or_else(|| "none".to_string());
        let pending = if self.pending.is_empty() {
            "none".to_string()
        } else {
            self.pending
                .iter()
                .map(|p| format!("#{}", p.target_game_number))
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "📊 Predictor status\n\
             Intelligent mode: {}\n\
             Consecutive failures: {}/{}\n\
             Verified predictions: {} ({} successes)\n\
             Draws recorded: {} (last: {})\n\
             Pending targets: {}\n\
             Last Queen prediction: {}",
            mode,
            self.consecutive_failures,
            self.failure_threshold,
            self.total_predictions,
            self.total_successes,
            self.draws_recorded,
            self.last_game_number.map(|n| format!("#{}", n)).unwrap_or_else(|| "-".to_string()),
            pending,
            last,
        )
    }
}

/// The single mutual-exclusion domain of the core
#[derive(Debug)]
pub struct Predictor {
    history: DrawHistory,
    book: PredictionBook,
    mode: ModeController,
}

impl Predictor {
    pub fn new(config: &PredictorConfig) -> Self {
        Self {
            history: DrawHistory::new(config.history_limit),
            book: PredictionBook::with_archive_limit(config.archive_limit),
            mode: ModeController::new(config.failure_threshold),
        }
    }

    /// Wrap into the shared, lock-protected form
    pub fn shared(self) -> SharedPredictor {
        Arc::new(Mutex::new(self))
    }

    /// Apply one raw draw announcement
    ///
    /// Order: parse, append, settle due predictions (which may escalate the
    /// mode), then classify and register when the mode is INTELLIGENT.
    pub fn ingest(&mut self, raw: &str) -> Result<IngestReport> {
        let parsed = ParsedDraw::parse(raw)?;
        if !parsed.finished {
            return Err(PredictorError::Unfinished { game_number: parsed.game_number });
        }

        let record = self.history.append(parsed)?.clone();
        debug!("Draw #{} recorded ({} cards)", record.game_number, record.cards.len());

        let mut outbound = Vec::new();
        let resolutions = self.book.on_draw(&record, &mut self.mode);
        for resolution in &resolutions {
            outbound.push(Outbound::Verdict {
                target_game_number: resolution.prediction.target_game_number,
                status: resolution.prediction.status,
            });
            if let Some(ModeTransition::Escalated { consecutive_failures }) = resolution.transition {
                outbound.push(Outbound::Alert {
                    text: self.escalation_alert(consecutive_failures),
                });
            }
        }

        let mut signal = None;
        let mut registered = None;
        if self.mode.is_intelligent() {
            signal = classify(&record.cards);
            if let Some(rule) = resolve(signal) {
                match self.book.register(&record, rule) {
                    Ok(prediction) => {
                        outbound.push(Outbound::Prediction {
                            target_game_number: prediction.target_game_number,
                            rule_id: prediction.rule_id,
                            label: prediction.label,
                        });
                        registered = Some(prediction);
                    }
                    Err(e) => debug!("Signal {:?} on #{} not registered: {}", signal, record.game_number, e),
                }
            }
        }

        Ok(IngestReport {
            record,
            signal,
            registered,
            resolutions,
            outbound,
        })
    }

    fn escalation_alert(&self, consecutive_failures: u32) -> String {
        format!(
            "🚨 INTELLIGENT MODE ENABLED\n{} consecutive failed predictions.\n\n{}",
            consecutive_failures,
            self.analyze_history().render()
        )
    }

    pub fn status(&self) -> PredictorStatus {
        let state = self.mode.state();
        PredictorStatus {
            mode: self.mode.mode(),
            intelligent_mode: state.intelligent_mode,
            consecutive_failures: state.consecutive_failures,
            failure_threshold: self.mode.failure_threshold(),
            total_predictions: state.total_predictions,
            total_successes: state.total_successes,
            draws_recorded: self.history.len(),
            last_game_number: self.history.last_game_number(),
            pending: self.book.pending().cloned().collect(),
            last_prediction: self.book.last_registered().cloned(),
        }
    }

    pub fn force_intelligent(&mut self) -> Option<ModeTransition> {
        self.mode.force_intelligent()
    }

    pub fn force_default(&mut self) -> Option<ModeTransition> {
        let transition = self.mode.force_default();
        info!("Mode is now {}", self.mode.mode());
        transition
    }

    /// Dry run of the detector over stored history
    pub fn analyze_history(&self) -> AnalysisReport {
        analysis::analyze(&self.history)
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub fn book(&self) -> &PredictionBook {
        &self.book
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(&PredictorConfig::default())
    }
}
