//! CLI interface for dame-predictor

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::gateway::{self, Gateway};
use crate::messaging::telegram::{TelegramClient, TelegramNotifier};
use crate::messaging::{Dispatcher, LogNotifier};
use crate::predictor::Predictor;
use crate::server::{self, ServerState};

#[derive(Parser)]
#[command(name = "dame-predictor")]
#[command(about = "Watches a card-draw channel and predicts Queens", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no command given)
    Run,
    /// Feed draws from a file, one post per line, and print the outcome
    Replay {
        /// File with raw draw posts
        file: PathBuf,
        /// Start in intelligent mode
        #[arg(short, long)]
        intelligent: bool,
    },
    /// Show or create the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Run) => {
            let config = load_config(cli.config.as_deref())?;
            run_bot(config).await
        }
        Some(Commands::Replay { file, intelligent }) => {
            let config = load_config(cli.config.as_deref())?;
            replay(&config, &file, intelligent).await
        }
        Some(Commands::Config { show, init }) => {
            let path = match cli.config {
                Some(path) => path,
                None => config::config_path()?,
            };

            if init {
                if path.exists() {
                    println!("Config already exists at {}", path.display());
                } else {
                    Config::default().save_to(&path)?;
                    println!("✓ Wrote default config to {}", path.display());
                }
            }

            if show || !init {
                let mut config = load_config(Some(path.as_path()))?;
                config.apply_env()?;
                println!("# {}", path.display());
                config::show_config(&config)?;
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.exists() => Config::load_from(path),
        Some(path) => {
            warn!("Config file {} not found, using defaults", path.display());
            Ok(Config::default())
        }
        None => Config::load(),
    }
}

async fn run_bot(mut config: Config) -> Result<()> {
    config.apply_env()?;
    config.log_summary();

    if !config.telegram.is_configured() {
        bail!("Bot token not configured. Set BOT_TOKEN or telegram.bot_token.");
    }
    if config.telegram.source_channel_id.is_none() {
        bail!("Source channel not configured. Set TARGET_CHANNEL_ID or telegram.source_channel_id.");
    }

    let predictor = Predictor::new(&config.predictor).shared();
    let client = TelegramClient::new(config.telegram.clone())?;

    match client.get_me().await {
        Ok(me) => info!("Connected as @{}", me.username.as_deref().unwrap_or(&me.first_name)),
        Err(e) => warn!("getMe failed: {:#}", e),
    }

    let notifier = TelegramNotifier::new(client.clone())?;
    let (dispatcher, dispatch_handle) = Dispatcher::spawn(Arc::new(notifier));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server_handle = if config.server.enabled {
        let server_config = config.server.clone();
        let state = ServerState::new(predictor.clone());
        let shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server::start(&server_config, state, shutdown).await {
                warn!("Health server stopped: {:#}", e);
            }
        }))
    } else {
        None
    };

    let gateway_shutdown = shutdown_tx.subscribe();
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received");
            let _ = signal_tx.send(());
        }
    });

    let gateway = Gateway::new(config.gateway.clone(), client, predictor, dispatcher)?;
    let result = gateway.run(gateway_shutdown).await;

    let _ = shutdown_tx.send(());
    if let Some(handle) = server_handle {
        let _ = handle.await;
    }
    drop(gateway);
    let _ = dispatch_handle.await;

    result
}

async fn replay(config: &Config, file: &Path, intelligent: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let predictor = Predictor::new(&config.predictor).shared();
    if intelligent {
        predictor.lock().await.force_intelligent();
    }

    let (dispatcher, handle) = Dispatcher::spawn(Arc::new(LogNotifier));
    let mut accepted = 0usize;
    for line in contents.lines().filter(|l| !l.trim().is_empty()) {
        if gateway::ingest_and_dispatch(&predictor, &dispatcher, line).await.is_some() {
            accepted += 1;
        }
    }
    drop(dispatcher);
    let _ = handle.await;

    let p = predictor.lock().await;
    println!("Replayed {} draw(s) from {}\n", accepted, file.display());
    println!("{}\n", p.status().render());
    println!("{}", p.analyze_history().render());
    Ok(())
}
