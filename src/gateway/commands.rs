//! Operator commands and inline-button callbacks

use crate::messaging::telegram::{InlineKeyboard, TelegramChat};
use crate::predictor::{ModeTransition, SharedPredictor};

const ACTIVATE_DATA: &str = "activate_intelligent_mode";
const DEACTIVATE_DATA: &str = "deactivate_intelligent_mode";

const HELP_TEXT: &str = "🤖 COMMANDS:\n\
/status - Intelligent mode state and failure count\n\
/inter - Analyse stored draws and offer to enable intelligent mode\n\
/intelligent - Enable intelligent mode\n\
/defaut - Disable intelligent mode and reset failures";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Status,
    Inter,
    Intelligent,
    Defaut,
}

impl Command {
    /// Parse `/name`, `/name@BotName` and `/name args`
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name.to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "status" => Some(Command::Status),
            "inter" => Some(Command::Inter),
            "intelligent" => Some(Command::Intelligent),
            "defaut" | "default" => Some(Command::Defaut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    ActivateIntelligent,
    DeactivateIntelligent,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            ACTIVATE_DATA => Some(CallbackAction::ActivateIntelligent),
            DEACTIVATE_DATA => Some(CallbackAction::DeactivateIntelligent),
            _ => None,
        }
    }
}

/// Text plus optional keyboard to send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None }
    }
}

/// Private chats and the admin chat may run commands
pub fn is_authorized(chat: &TelegramChat, admin_chat_id: Option<i64>) -> bool {
    chat.chat_type == "private" || admin_chat_id == Some(chat.id)
}

pub async fn execute(command: Command, predictor: &SharedPredictor) -> Reply {
    match command {
        Command::Start => Reply::text("Queen prediction bot started. Use /status or /help."),
        Command::Help => Reply::text(HELP_TEXT),
        Command::Status => Reply::text(predictor.lock().await.status().render()),
        Command::Inter => {
            let (report, failures, threshold) = {
                let p = predictor.lock().await;
                let status = p.status();
                (p.analyze_history(), status.consecutive_failures, status.failure_threshold)
            };

            let title = if failures >= threshold {
                "🚨 INTELLIGENT MODE REQUIRED"
            } else {
                "🔍 QUEEN CYCLE ANALYSIS"
            };

            Reply {
                text: format!(
                    "{}\n\n{}\n\nEnable intelligent mode?",
                    title,
                    report.render()
                ),
                keyboard: Some(InlineKeyboard::row(vec![
                    ("✅ YES (enable intelligent mode)", ACTIVATE_DATA),
                    ("❌ NO (stay in default mode)", DEACTIVATE_DATA),
                ])),
            }
        }
        Command::Intelligent => {
            let transition = predictor.lock().await.force_intelligent();
            Reply::text(match transition {
                Some(_) => "✅ Intelligent mode ENABLED.",
                None => "Intelligent mode is already enabled.",
            })
        }
        Command::Defaut => {
            predictor.lock().await.force_default();
            Reply::text("✅ Intelligent mode DISABLED. Failures reset to 0.")
        }
    }
}

pub async fn execute_callback(action: CallbackAction, predictor: &SharedPredictor) -> String {
    let mut p = predictor.lock().await;
    match action {
        CallbackAction::ActivateIntelligent => match p.force_intelligent() {
            Some(ModeTransition::Activated) => "✅ Intelligent mode ENABLED. Predictions resume on the next draw.".to_string(),
            _ => "Intelligent mode is already enabled.".to_string(),
        },
        CallbackAction::DeactivateIntelligent => {
            p.force_default();
            "❌ Intelligent mode DISABLED. Predictions stay on standby.".to_string()
        }
    }
}
