//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - The OpenAPI document at `/api-docs/openapi.json`
//! - Health route
//! - `/api/proxy` pass-through to the inventory backend
//! - `/api/auth` login, logout and current session
//! - `/api/inventory`, `/api/chat` and `/api/report` dashboard routes

mod auth;
mod chat;
pub mod doc;
mod health;
mod inventory;
mod proxy;
mod report;

use axum::routing::get;
use axum::{Json, Router, middleware};
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::middleware::{cors, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let api_doc = doc::get_docs();

    Router::new()
        .merge(health::router())
        .merge(proxy::router())
        .merge(auth::router())
        .merge(inventory::router())
        .merge(chat::router())
        .merge(report::router())
        .route("/api-docs/openapi.json", get(move || async move { Json(api_doc) }))
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn_with_state(state.clone(), trace::trace_middleware))
        .with_state(state)
}
