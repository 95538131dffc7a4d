//! Outbound notifications
//!
//! The core returns [`Outbound`] items; the [`Dispatcher`] forwards them to a
//! [`Notifier`] on its own task so callers never wait on network latency.
//!
//! Supported notifiers:
//! - Telegram: prediction channel posts, verdict edits, admin alerts
//! - Log: tracing only, used for offline replay

pub mod telegram;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::predictor::{Outbound, PredictionStatus};

/// Delivery side of the predictor
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a prediction for `target_game_number`
    async fn send_prediction(&self, target_game_number: u64, label: &str) -> Result<()>;

    /// Report how a prediction ended
    async fn send_verdict(&self, target_game_number: u64, status: PredictionStatus) -> Result<()>;

    /// Free-form message for the operator
    async fn send_alert(&self, text: &str) -> Result<()>;

    /// Notifier name for logs
    fn name(&self) -> &'static str;
}

/// Forward one item to a notifier
pub async fn deliver(notifier: &dyn Notifier, item: &Outbound) -> Result<()> {
    match item {
        Outbound::Prediction { target_game_number, label, .. } => {
            notifier.send_prediction(*target_game_number, label).await
        }
        Outbound::Verdict { target_game_number, status } => {
            notifier.send_verdict(*target_game_number, *status).await
        }
        Outbound::Alert { text } => notifier.send_alert(text).await,
    }
}

/// Fire-and-forget queue in front of a notifier
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Dispatcher {
    /// Start the delivery task; it ends once every `Dispatcher` clone is dropped
    pub fn spawn(notifier: Arc<dyn Notifier>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

        let handle = tokio::spawn(async move {
            info!("Outbound dispatcher started ({})", notifier.name());
            while let Some(item) = rx.recv().await {
                if let Err(e) = deliver(notifier.as_ref(), &item).await {
                    warn!("{} delivery failed for {:?}: {:#}", notifier.name(), item, e);
                }
            }
            debug!("Outbound dispatcher stopped");
        });

        (Self { tx }, handle)
    }

    /// Queue items without waiting for delivery
    pub fn dispatch(&self, items: impl IntoIterator<Item = Outbound>) {
        for item in items {
            if self.tx.send(item).is_err() {
                warn!("Outbound dispatcher is gone, dropping notification");
                return;
            }
        }
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send_prediction(&self, target_game_number: u64, label: &str) -> Result<()> {
        info!("[prediction] {}", telegram::prediction_text(target_game_number, label));
        Ok(())
    }

    async fn send_verdict(&self, target_game_number: u64, status: PredictionStatus) -> Result<()> {
        info!("[verdict] {}", telegram::verdict_text(target_game_number, status, None));
        Ok(())
    }

    async fn send_alert(&self, text: &str) -> Result<()> {
        info!("[alert] {}", text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
