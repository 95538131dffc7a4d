//! Telegram messaging integration
//!
//! Uses the Telegram Bot API both ways: long polling for the source channel
//! and commands, and `sendMessage`/`editMessageText` for predictions.
//!
//! # Setup
//!
//! 1. Create a bot via @BotFather on Telegram
//! 2. Add it to the source channel and as admin of the prediction channel
//! 3. Set `BOT_TOKEN`, `TARGET_CHANNEL_ID` and `PREDICTION_CHANNEL_ID`

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::messaging::Notifier;
use crate::predictor::PredictionStatus;

/// Telegram API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram configuration (`[telegram]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather (format: 123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11)
    #[serde(default)]
    pub bot_token: String,
    /// Channel announcing the draws
    #[serde(default)]
    pub source_channel_id: Option<i64>,
    /// Channel receiving predictions
    #[serde(default)]
    pub prediction_channel_id: Option<i64>,
    /// Chat receiving alerts, allowed to run commands
    #[serde(default)]
    pub admin_chat_id: Option<i64>,
    /// Parse mode for messages (HTML, Markdown, MarkdownV2, or None)
    #[serde(default)]
    pub parse_mode: Option<String>,
    /// HTTP timeout, must exceed the long-poll timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// API base URL (for self-hosted bot API servers)
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_request_timeout() -> u64 {
    40
}

fn default_api_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            source_channel_id: None,
            prediction_channel_id: None,
            admin_chat_id: None,
            parse_mode: None,
            request_timeout_secs: default_request_timeout(),
            api_base: default_api_base(),
        }
    }
}

impl TelegramConfig {
    /// Create a new config with bot token
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            ..Default::default()
        }
    }

    /// Check if Telegram is properly configured
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && self.bot_token.contains(':')
    }

    /// Get API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

/// Telegram API envelope
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i32>,
}

/// Telegram message info
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub date: i64,
    pub text: Option<String>,
    pub chat: TelegramChat,
    pub from: Option<TelegramUser>,
}

/// Telegram chat info
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// Telegram user info
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

/// Inline keyboard button press
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    pub message: Option<TelegramMessage>,
    pub data: Option<String>,
}

/// Telegram update (incoming message/event)
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub edited_message: Option<TelegramMessage>,
    pub channel_post: Option<TelegramMessage>,
    pub edited_channel_post: Option<TelegramMessage>,
    pub callback_query: Option<CallbackQuery>,
}

impl TelegramUpdate {
    /// The message carried by this update, whichever kind it is
    pub fn any_message(&self) -> Option<&TelegramMessage> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .or(self.edited_channel_post.as_ref())
    }
}

/// One inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

/// Inline keyboard markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn row(buttons: Vec<(&str, &str)>) -> Self {
        Self {
            inline_keyboard: vec![buttons
                .into_iter()
                .map(|(text, data)| InlineButton {
                    text: text.to_string(),
                    callback_data: data.to_string(),
                })
                .collect()],
        }
    }
}

/// Send message request
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboard>,
}

/// Telegram Bot API client
#[derive(Debug, Clone)]
pub struct TelegramClient {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// POST a Bot API method and unwrap the envelope
    async fn call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let url = self.config.api_url(method);

        let response: TelegramResponse<Res> = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to call Telegram {}", method))?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        if response.ok {
            response.result.context("No result in response")
        } else {
            let error_msg = response.description.unwrap_or_else(|| "Unknown error".to_string());
            error!("Telegram API error on {}: {} (code: {:?})", method, error_msg, response.error_code);
            bail!("Telegram API error: {}", error_msg)
        }
    }

    /// Test the bot token and get bot info
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Send a text message
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<TelegramMessage> {
        self.send_message_with_keyboard(chat_id, text, None).await
    }

    /// Send a text message with an optional inline keyboard
    pub async fn send_message_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<TelegramMessage> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: self.config.parse_mode.as_deref(),
            reply_markup: keyboard,
        };

        debug!("Sending Telegram message to {}", chat_id);
        let message: TelegramMessage = self.call("sendMessage", &request).await?;
        info!("Telegram message {} sent to {}", message.message_id, chat_id);
        Ok(message)
    }

    /// Edit a previously sent message
    pub async fn edit_message(&self, chat_id: i64, message_id: i64, new_text: &str) -> Result<()> {
        #[derive(Serialize)]
        struct EditRequest<'a> {
            chat_id: i64,
            message_id: i64,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
        }

        let request = EditRequest {
            chat_id,
            message_id,
            text: new_text,
            parse_mode: self.config.parse_mode.as_deref(),
        };

        // Result is the edited message, or `true` for inline messages
        let _: serde_json::Value = self.call("editMessageText", &request).await?;
        Ok(())
    }

    /// Acknowledge an inline button press
    pub async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> Result<bool> {
        #[derive(Serialize)]
        struct AnswerRequest<'a> {
            callback_query_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            text: Option<&'a str>,
        }

        self.call("answerCallbackQuery", &AnswerRequest { callback_query_id, text }).await
    }

    /// Drop any webhook so long polling receives updates
    pub async fn delete_webhook(&self) -> Result<bool> {
        self.call("deleteWebhook", &serde_json::json!({ "drop_pending_updates": false })).await
    }

    /// Long-poll for updates
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Vec<TelegramUpdate>> {
        #[derive(Serialize)]
        struct GetUpdatesRequest<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            offset: Option<i64>,
            limit: i32,
            timeout: u32,
            allowed_updates: &'a [&'a str],
        }

        let request = GetUpdatesRequest {
            offset,
            limit: 100,
            timeout: timeout_secs,
            allowed_updates: &[
                "message",
                "edited_message",
                "channel_post",
                "edited_channel_post",
                "callback_query",
            ],
        };

        self.call("getUpdates", &request).await
    }
}

/// Channel text announcing a prediction
pub fn prediction_text(target_game_number: u64, label: &str) -> String {
    format!("🎯{}🎯: Dame (Q) statut :⏳ ({})", target_game_number, label)
}

/// Channel text once the prediction is settled
pub fn verdict_text(target_game_number: u64, status: PredictionStatus, label: Option<&str>) -> String {
    let symbol = match status {
        PredictionStatus::Pending => "⏳",
        PredictionStatus::Success => "✅0️⃣",
        PredictionStatus::Failure => "❌",
    };
    match label {
        Some(label) => format!("🎯{}🎯: Dame (Q) statut :{} ({})", target_game_number, symbol, label),
        None => format!("🎯{}🎯: Dame (Q) statut :{}", target_game_number, symbol),
    }
}

#[derive(Debug, Clone)]
struct Announcement {
    message_id: i64,
    label: String,
}

/// Posts predictions to the prediction channel and edits them on verdict
pub struct TelegramNotifier {
    client: TelegramClient,
    prediction_chat_id: i64,
    admin_chat_id: Option<i64>,
    announced: Mutex<HashMap<u64, Announcement>>,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient) -> Result<Self> {
        let prediction_chat_id = client
            .config()
            .prediction_channel_id
            .context("Prediction channel not configured. Set PREDICTION_CHANNEL_ID.")?;
        let admin_chat_id = client.config().admin_chat_id;

        Ok(Self {
            client,
            prediction_chat_id,
            admin_chat_id,
            announced: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send_prediction(&self, target_game_number: u64, label: &str) -> Result<()> {
        let text = prediction_text(target_game_number, label);
        let message = self.client.send_message(self.prediction_chat_id, &text).await?;

        self.announced.lock().await.insert(
            target_game_number,
            Announcement {
                message_id: message.message_id,
                label: label.to_string(),
            },
        );
        Ok(())
    }

    async fn send_verdict(&self, target_game_number: u64, status: PredictionStatus) -> Result<()> {
        let announcement = self.announced.lock().await.remove(&target_game_number);

        match announcement {
            Some(a) => {
                let text = verdict_text(target_game_number, status, Some(&a.label));
                self.client.edit_message(self.prediction_chat_id, a.message_id, &text).await
            }
            None => {
                warn!("No announced message for #{}, posting verdict instead", target_game_number);
                let text = verdict_text(target_game_number, status, None);
                self.client.send_message(self.prediction_chat_id, &text).await.map(|_| ())
            }
        }
    }

    async fn send_alert(&self, text: &str) -> Result<()> {
        match self.admin_chat_id {
            Some(chat_id) => self.client.send_message(chat_id, text).await.map(|_| ()),
            None => {
                warn!("ADMIN_CHAT_ID not configured, alert only logged: {}", text);
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let config = TelegramConfig::new("123456:valid_token_format");
        assert!(config.is_configured());

        let config = TelegramConfig::new("invalid_token");
        assert!(!config.is_configured());

        let config = TelegramConfig::new("");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_api_url_generation() {
        let config = TelegramConfig::new("123456:token");
        assert_eq!(config.api_url("sendMessage"), "https://api.telegram.org/bot123456:token/sendMessage");
        assert_eq!(config.api_url("getUpdates"), "https://api.telegram.org/bot123456:token/getUpdates");
    }

    #[test]
    fn test_prediction_and_verdict_text() {
        assert_eq!(prediction_text(12, "Messenger"), "🎯12🎯: Dame (Q) statut :⏳ (Messenger)");
        assert_eq!(
            verdict_text(12, PredictionStatus::Success, Some("Messenger")),
            "🎯12🎯: Dame (Q) statut :✅0️⃣ (Messenger)"
        );
        assert_eq!(verdict_text(12, PredictionStatus::Failure, None), "🎯12🎯: Dame (Q) statut :❌");
    }

    #[test]
    fn test_update_deserialization() {
        let json = r##"{
            "update_id": 7,
            "edited_channel_post": {
                "message_id": 55,
                "date": 1700000000,
                "text": "#N744. 5(J♠️K♥️) ✅",
                "chat": {"id": -1003424179389, "type": "channel", "title": "Source"}
            }
        }"##;
        let update: TelegramUpdate = serde_json::from_str(json).unwrap();
        let message = update.any_message().unwrap();
        assert_eq!(message.chat.id, -1003424179389);
        assert_eq!(message.chat.chat_type, "channel");
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn test_callback_deserialization() {
        let json = r#"{
            "update_id": 8,
            "callback_query": {
                "id": "abc",
                "from": {"id": 1, "is_bot": false, "first_name": "Op"},
                "message": {"message_id": 3, "date": 0, "chat": {"id": 1, "type": "private"}},
                "data": "activate_intelligent_mode"
            }
        }"#;
        let update: TelegramUpdate = serde_json::from_str(json).unwrap();
        let query = update.callback_query.unwrap();
        assert_eq!(query.data.as_deref(), Some("activate_intelligent_mode"));
        assert!(update.message.is_none());
    }

    #[test]
    fn test_keyboard_serialization() {
        let keyboard = InlineKeyboard::row(vec![("Yes", "yes"), ("No", "no")]);
        let value = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(value["inline_keyboard"][0][1]["callback_data"], "no");
    }

    #[test]
    fn test_notifier_requires_prediction_channel() {
        let client = TelegramClient::new(TelegramConfig::new("1:abc")).unwrap();
        assert!(TelegramNotifier::new(client).is_err());
    }
}
