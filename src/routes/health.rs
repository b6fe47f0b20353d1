//! Health check and liveness endpoints.

use axum::extract::State;
use axum::response::Json;
use serde_json::json;

use crate::server::AppState;

/// Liveness probe. No side effects, cheap enough for connectivity polling
/// by clients and load balancers alike.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}

/// Health check with database status.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (status, database) = match state.store.health_check().await {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            tracing::warn!("health check failed: {e}");
            ("degraded", "error")
        }
    };
    Json(json!({
        "message": "Portico API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "status": status,
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
