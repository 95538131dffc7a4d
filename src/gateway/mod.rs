//! Gateway - long-polling listener for the source channel and commands
//!
//! Source channel posts (new or edited) become draws; private or admin
//! messages become commands. The predictor lock is never held while talking
//! to Telegram.

pub mod commands;

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::messaging::telegram::{CallbackQuery, TelegramClient, TelegramMessage, TelegramUpdate};
use crate::messaging::Dispatcher;
use crate::predictor::{IngestReport, SharedPredictor};

use commands::{CallbackAction, Command};

/// Gateway configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GatewayConfig {
    /// Long-poll timeout passed to getUpdates
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
    /// Pause after a failed poll
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
}

fn default_poll_timeout() -> u32 {
    30
}

fn default_error_backoff() -> u64 {
    5
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: default_poll_timeout(),
            error_backoff_secs: default_error_backoff(),
        }
    }
}

/// Feed one source post to the predictor, then queue its notifications
///
/// Returns the report when the draw was accepted.
pub async fn ingest_and_dispatch(
    predictor: &SharedPredictor,
    dispatcher: &Dispatcher,
    text: &str,
) -> Option<IngestReport> {
    let result = predictor.lock().await.ingest(text);

    match result {
        Ok(report) => {
            info!(
                "Draw #{} accepted: signal {:?}, {} resolved, {} notification(s)",
                report.record.game_number,
                report.signal,
                report.resolutions.len(),
                report.outbound.len()
            );
            dispatcher.dispatch(report.outbound.iter().cloned());
            Some(report)
        }
        Err(e) if e.is_noise() => {
            debug!("Source post skipped: {}", e);
            None
        }
        Err(e) => {
            warn!("Source post dropped: {}", e);
            None
        }
    }
}

/// The polling daemon
pub struct Gateway {
    config: GatewayConfig,
    client: TelegramClient,
    predictor: SharedPredictor,
    dispatcher: Dispatcher,
    source_channel_id: i64,
    admin_chat_id: Option<i64>,
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        client: TelegramClient,
        predictor: SharedPredictor,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        let source_channel_id = client
            .config()
            .source_channel_id
            .context("Source channel not configured. Set TARGET_CHANNEL_ID.")?;
        let admin_chat_id = client.config().admin_chat_id;

        Ok(Self {
            config,
            client,
            predictor,
            dispatcher,
            source_channel_id,
            admin_chat_id,
        })
    }

    /// Poll until a shutdown signal arrives
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        match self.client.delete_webhook().await {
            Ok(_) => info!("Webhook removed, switching to long polling"),
            Err(e) => warn!("Failed to remove webhook: {:#}", e),
        }

        info!("Listening to source channel {}", self.source_channel_id);
        let mut offset: Option<i64> = None;

        loop {
            let updates = tokio::select! {
                _ = shutdown.recv() => {
                    info!("Gateway shutting down");
                    return Ok(());
                }
                result = self.client.get_updates(offset, self.config.poll_timeout_secs) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        if let Err(e) = self.handle_update(&update).await {
                            warn!("Failed to handle update {}: {:#}", update.update_id, e);
                        }
                    }
                }
                Err(e) => {
                    warn!("Polling failed: {:#}", e);
                    tokio::time::sleep(Duration::from_secs(self.config.error_backoff_secs)).await;
                }
            }
        }
    }

    pub async fn handle_update(&self, update: &TelegramUpdate) -> Result<()> {
        if let Some(query) = &update.callback_query {
            return self.handle_callback(query).await;
        }

        let Some(message) = update.any_message() else {
            return Ok(());
        };
        let text = message.text.as_deref().unwrap_or_default();

        if message.chat.id == self.source_channel_id {
            ingest_and_dispatch(&self.predictor, &self.dispatcher, text).await;
            return Ok(());
        }

        if let Some(command) = Command::parse(text) {
            return self.handle_command(command, message).await;
        }

        Ok(())
    }

    async fn handle_command(&self, command: Command, message: &TelegramMessage) -> Result<()> {
        if !commands::is_authorized(&message.chat, self.admin_chat_id) {
            debug!("Ignoring {:?} from unauthorized chat {}", command, message.chat.id);
            return Ok(());
        }

        info!("Command {:?} from chat {}", command, message.chat.id);
        let reply = commands::execute(command, &self.predictor).await;
        self.client
            .send_message_with_keyboard(message.chat.id, &reply.text, reply.keyboard.as_ref())
            .await?;
        Ok(())
    }

    async fn handle_callback(&self, query: &CallbackQuery) -> Result<()> {
        self.client.answer_callback_query(&query.id, None).await?;

        let Some(message) = &query.message else {
            return Ok(());
        };
        if !commands::is_authorized(&message.chat, self.admin_chat_id) {
            return Ok(());
        }

        let text = match query.data.as_deref().and_then(CallbackAction::parse) {
            Some(action) => commands::execute_callback(action, &self.predictor).await,
            None => "Unknown action.".to_string(),
        };
        self.client.edit_message(message.chat.id, message.message_id, &text).await
    }
}
