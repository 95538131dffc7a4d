//! Error taxonomy for the prediction core
//!
//! Every variant is recoverable: the offending input is skipped and the
//! existing history, pending predictions and mode counters stay untouched.

use thiserror::Error;

/// Why a raw draw text could not be turned into a draw
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no game number found in draw text")]
    MissingGameNumber,
    #[error("game number is not a valid integer: {0}")]
    InvalidGameNumber(String),
    #[error("no card group found in draw #{0}")]
    MissingFirstGroup(u64),
    #[error("first card group of draw #{0} holds no recognisable card")]
    EmptyFirstGroup(u64),
}

/// Main error type of the prediction core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictorError {
    /// Malformed draw text
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Draw is still being played (the source will edit it later)
    #[error("draw #{game_number} is not finished yet")]
    Unfinished { game_number: u64 },

    /// Non-increasing or duplicate game number
    #[error("draw #{game_number} rejected: last accepted draw is #{last}")]
    Validation { game_number: u64, last: u64 },

    /// A pending prediction already targets this game number
    #[error("a prediction already targets game #{target_game_number}")]
    RegistrationConflict { target_game_number: u64 },

    /// Target game number would not fit in a `u64`
    #[error("draw #{game_number} leaves no room for a prediction target")]
    TargetOutOfRange { game_number: u64 },

    /// Query for a game number that is not in the store
    #[error("draw #{0} not found")]
    NotFound(u64),
}

impl PredictorError {
    /// Whether the error only means "skip this input"
    ///
    /// Everything the core reports is non-fatal; the distinction the service
    /// cares about is whether the input was noise or a real anomaly.
    ///
    /// A repeated game number is noise too: the source re-edits finished
    /// posts (e.g. `✅` to `🔰`).
    pub fn is_noise(&self) -> bool {
        match self {
            PredictorError::Parse(_) | PredictorError::Unfinished { .. } => true,
            PredictorError::Validation { game_number, last } => game_number == last,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;
