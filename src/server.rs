//! # Server Module
//!
//! HTTP server setup and route configuration for the Portico server.

use anyhow::{Context, Result};
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::jwt::JwtService;
use crate::config::Config;
use crate::database::store::AccountStore;
use crate::database::{DatabaseConfig, DatabaseConnection};
use crate::routes::{auth, contact, health};
use crate::services::Mailer;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub jwt_service: Arc<JwtService>,
    pub mailer: Arc<Mailer>,
}

/// Assemble the application router. Kept separate from [`start`] so tests
/// can drive the full routing stack in-process.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(health::ping))
        .route("/", get(health::health))
        .route("/contact", post(contact::submit))
        .merge(auth::create_auth_routes(state.jwt_service.clone()))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::ORIGIN,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true))
}

/// Starts the Portico HTTP server.
///
/// Initializes the token service, database pool, and mailer from the
/// supplied configuration, runs pending migrations, and serves the
/// application with the Axum web framework on the Tokio runtime.
pub async fn start(config: Config) -> Result<()> {
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret));

    let db_config = DatabaseConfig::from_env()?;
    let db = DatabaseConnection::new(db_config).await?;
    db.migrate().await?;

    let mailer = Arc::new(Mailer::new(config.email.clone()));

    let state = AppState {
        store: Arc::new(db),
        jwt_service,
        mailer,
    };

    let app = build_router(state)
        .layer(ServiceBuilder::new().layer(cors_layer(&config.cors_allowed_origins)?));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Portico Server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🔐 Auth endpoints available at http://{}/auth/*", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
