//! Learner HTTP Server Binary
//!
//! # Environment Variables
//!
//! - `LEARNER_DB_PATH`, `LEARNER_BIND`, `LEARNER_PORT`,
//!   `LEARNER_CORS_ORIGINS`, `LEARNER_REQUEST_TIMEOUT_MS` (see `config`)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use learner_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🚀 Learner HTTP Server");

    let config = ServerConfig::from_env()?;
    tracing::info!("📡 Listening address: {}", config.socket_addr());

    start_server(config).await
}
