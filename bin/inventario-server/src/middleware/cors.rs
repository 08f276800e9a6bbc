use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

pub fn cors_layer(state: Arc<AppState>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .max_age(PREFLIGHT_MAX_AGE);

    let Some(origins_str) = &state.config.cors_allowed_origins else {
        // Wildcard; set INVENTARIO_CORS_ORIGINS to restrict.
        return base.allow_origin(Any);
    };
    let origins: Vec<axum::http::HeaderValue> = origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins)
    }
}
