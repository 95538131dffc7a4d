//! Configuration management
//!
//! TOML file under the platform config directory, with environment
//! overrides for the values deployments usually inject.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::messaging::telegram::TelegramConfig;
use crate::predictor::mode::DEFAULT_FAILURE_THRESHOLD;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot and channel settings
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Long-polling listener settings
    #[serde(default)]
    pub gateway: crate::gateway::GatewayConfig,
    /// Health/status HTTP server
    #[serde(default)]
    pub server: ServerConfig,
    /// Prediction core tuning
    #[serde(default)]
    pub predictor: PredictorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Serve health and status endpoints
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Draws kept in history (0 keeps everything)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Consecutive failures that switch on intelligent mode
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Resolved predictions kept for inspection
    #[serde(default = "default_archive_limit")]
    pub archive_limit: usize,
}

fn default_history_limit() -> usize {
    100
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_archive_limit() -> usize {
    200
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            failure_threshold: default_failure_threshold(),
            archive_limit: default_archive_limit(),
        }
    }
}

impl Config {
    /// Load from the default path, creating it with defaults if missing
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            Ok(config)
        }
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    ///
    /// Keys: `BOT_TOKEN`, `TARGET_CHANNEL_ID`, `PREDICTION_CHANNEL_ID`,
    /// `ADMIN_CHAT_ID`, `PORT`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(id) = get("TARGET_CHANNEL_ID") {
            self.telegram.source_channel_id = Some(parse_chat_id("TARGET_CHANNEL_ID", &id)?);
        }
        if let Some(id) = get("PREDICTION_CHANNEL_ID") {
            self.telegram.prediction_channel_id = Some(parse_chat_id("PREDICTION_CHANNEL_ID", &id)?);
        }
        if let Some(id) = get("ADMIN_CHAT_ID") {
            self.telegram.admin_chat_id = Some(parse_chat_id("ADMIN_CHAT_ID", &id)?);
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }
        Ok(())
    }

    /// Log the effective configuration without secrets
    pub fn log_summary(&self) {
        info!(
            "Telegram: token {}, source {:?}, predictions {:?}, admin {:?}",
            if self.telegram.is_configured() { "configured" } else { "missing" },
            self.telegram.source_channel_id,
            self.telegram.prediction_channel_id,
            self.telegram.admin_chat_id,
        );
        info!(
            "Server: {} on {}:{}",
            if self.server.enabled { "enabled" } else { "disabled" },
            self.server.host,
            self.server.port
        );
        info!(
            "Predictor: history {}, failure threshold {}",
            self.predictor.history_limit, self.predictor.failure_threshold
        );
    }
}

fn parse_chat_id(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} is not a valid chat id: {}", key, value))
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "dame-predictor", "dame-predictor")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if !shown.telegram.bot_token.is_empty() {
        shown.telegram.bot_token = "***".to_string();
    }
    println!("{}", toml::to_string_pretty(&shown).context("Failed to serialize config")?);
    Ok(())
}
