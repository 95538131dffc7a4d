//! Dame Predictor - Queen forecasting bot for card-draw channels
//!
//! - Parses draws posted to a source channel
//! - Detects Jack/King/Ace signals and predicts a Queen two or three draws ahead
//! - Verifies each prediction and switches to intelligent mode after repeated failures
//! - Publishes predictions and verdicts to a Telegram channel
//!
//! # Example
//!
//! ```
//! use dame_predictor::predictor::Predictor;
//!
//! let mut predictor = Predictor::default();
//! predictor.force_intelligent();
//! let report = predictor.ingest("#N10. (J♠️5♥️) - (8♣️9♦️) ✅").unwrap();
//! assert_eq!(report.registered.unwrap().target_game_number, 12);
//! ```

pub mod predictor;
pub mod config;
pub mod messaging;
pub mod gateway;
pub mod server;
pub mod cli;

pub use config::Config;

pub use predictor::{
    IngestReport,
    Outbound,
    Predictor,
    PredictorStatus,
    SharedPredictor,
};

pub use messaging::{
    Dispatcher,
    Notifier,
};

pub use server::{
    ServerState,
    start as start_server,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

