//! Mode Controller - DEFAULT/INTELLIGENT state machine
//!
//! All mutation goes through `record_outcome`, `force_intelligent` and
//! `force_default`, each returning the transition it caused (if any).

use serde::Serialize;
use tracing::{info, warn};

/// Consecutive failures that switch DEFAULT to INTELLIGENT
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 2;

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Default,
    Intelligent,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Default => write!(f, "DEFAULT"),
            Mode::Intelligent => write!(f, "INTELLIGENT"),
        }
    }
}

/// Snapshot of the controller counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModeState {
    pub intelligent_mode: bool,
    pub consecutive_failures: u32,
    pub total_predictions: u64,
    pub total_successes: u64,
}

/// A mode change and what caused it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeTransition {
    /// Failure threshold reached
    Escalated { consecutive_failures: u32 },
    /// Manual activation
    Activated,
    /// Manual deactivation
    Deactivated,
}

#[derive(Debug)]
pub struct ModeController {
    state: ModeState,
    failure_threshold: u32,
}

impl ModeController {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            state: ModeState::default(),
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        if self.state.intelligent_mode {
            Mode::Intelligent
        } else {
            Mode::Default
        }
    }

    pub fn is_intelligent(&self) -> bool {
        self.state.intelligent_mode
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Record a verified prediction outcome
    pub fn record_outcome(&mut self, success: bool) -> Option<ModeTransition> {
        self.state.total_predictions += 1;

        if success {
            self.state.total_successes += 1;
            self.state.consecutive_failures = 0;
            return None;
        }

        self.state.consecutive_failures += 1;

        if !self.state.intelligent_mode
            && self.state.consecutive_failures == self.failure_threshold
        {
            self.state.intelligent_mode = true;
            warn!(
                "Failure threshold reached ({} consecutive), switching to INTELLIGENT mode",
                self.state.consecutive_failures
            );
            return Some(ModeTransition::Escalated {
                consecutive_failures: self.state.consecutive_failures,
            });
        }

        None
    }

    /// Manual DEFAULT -> INTELLIGENT; the failure counter is left as is
    pub fn force_intelligent(&mut self) -> Option<ModeTransition> {
        let was = self.state.intelligent_mode;
        self.state.intelligent_mode = true;
        info!("Intelligent mode forced on");
        (!was).then_some(ModeTransition::Activated)
    }

    /// Manual INTELLIGENT -> DEFAULT; always resets the failure counter
    pub fn force_default(&mut self) -> Option<ModeTransition> {
        let was = self.state.intelligent_mode;
        self.state.intelligent_mode = false;
        self.state.consecutive_failures = 0;
        info!("Intelligent mode forced off, failures reset");
        was.then_some(ModeTransition::Deactivated)
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let mode = ModeController::default();
        assert_eq!(mode.state(), ModeState::default());
        assert_eq!(mode.mode(), Mode::Default);
    }

    #[test]
    fn test_escalates_exactly_on_second_failure() {
        let mut mode = ModeController::default();

        assert_eq!(mode.record_outcome(false), None);
        assert!(!mode.is_intelligent());
        assert_eq!(mode.state().consecutive_failures, 1);

        assert_eq!(
            mode.record_outcome(false),
            Some(ModeTransition::Escalated { consecutive_failures: 2 })
        );
        assert!(mode.is_intelligent());
    }

    #[test]
    fn test_success_resets_streak() {
        let mut mode = ModeController::default();
        mode.record_outcome(false);
        mode.record_outcome(true);
        assert_eq!(mode.state().consecutive_failures, 0);
        assert_eq!(mode.record_outcome(false), None);
        assert!(!mode.is_intelligent());

        let state = mode.state();
        assert_eq!(state.total_predictions, 3);
        assert_eq!(state.total_successes, 1);
    }

    #[test]
    fn test_no_escalation_event_while_intelligent() {
        let mut mode = ModeController::default();
        mode.force_intelligent();
        assert_eq!(mode.record_outcome(false), None);
        assert_eq!(mode.record_outcome(false), None);
        assert_eq!(mode.state().consecutive_failures, 2);
    }

    #[test]
    fn test_force_default_always_resets_failures() {
        for failures in 0..5 {
            let mut mode = ModeController::new(10);
            for _ in 0..failures {
                mode.record_outcome(false);
            }
            mode.force_default();
            assert_eq!(mode.state().consecutive_failures, 0);
            assert!(!mode.is_intelligent());
        }
    }

    #[test]
    fn test_manual_transitions_report_changes_only() {
        let mut mode = ModeController::default();
        assert_eq!(mode.force_default(), None);
        assert_eq!(mode.force_intelligent(), Some(ModeTransition::Activated));
        assert_eq!(mode.force_intelligent(), None);
        assert_eq!(mode.force_default(), Some(ModeTransition::Deactivated));
    }

    #[test]
    fn test_force_intelligent_keeps_counter() {
        let mut mode = ModeController::new(3);
        mode.record_outcome(false);
        mode.force_intelligent();
        assert_eq!(mode.state().consecutive_failures, 1);
    }
}
