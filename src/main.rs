//! # Portico Server
//!
//! Account and session API server. See the library crate documentation for
//! the module layout.
//!
//! ## Environment Setup
//! Copy `.env.example` to `.env` and configure `DATABASE_URL` and
//! `JWT_SECRET` (both required) before running:
//! ```bash
//! cp .env.example .env
//! cargo run
//! ```

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use portico_server::{config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Structured logging: compact console output, level via RUST_LOG.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting Portico Server...");
    tracing::info!(
        "📦 Package: {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    // Fails fast on missing required configuration (JWT_SECRET, DATABASE_URL).
    let config = Config::from_env()?;

    server::start(config).await
}
