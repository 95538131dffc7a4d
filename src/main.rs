//! Dame Predictor - Queen forecasting bot

use dame_predictor::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Required by rustls 0.23 before reqwest opens HTTPS connections
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("Rustls crypto provider already installed");
    }

    // INFO by default, RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    cli::run().await
}
