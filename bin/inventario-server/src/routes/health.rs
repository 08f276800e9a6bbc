//! Health / heartbeat endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health))]
pub struct HealthApi;

/// Register health-check routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Heartbeat endpoint.
///
/// Reports the version, runtime mode, whether the assistant is enabled and
/// how many conversations are open.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = Value)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status":  "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.config.mode,
        "assistant": state.chatbot.is_some(),
        "conversations": state.conversations.len().await,
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn health_response_has_ok_status() {
        let state = Arc::new(AppState::new(Config::default()));
        let Json(body) = get_health(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mode"], "production");
        assert_eq!(body["assistant"], false);
    }

    #[tokio::test]
    async fn health_response_has_version() {
        let state = Arc::new(AppState::new(Config::default()));
        let Json(body) = get_health(State(state)).await;
        assert!(!body["version"].as_str().unwrap_or("").is_empty());
    }
}
