//! Same-origin proxy to the external inventory API.
//!
//! Browsers in development cannot call the backend directly because of CORS,
//! so the dashboard sends `/api/proxy?endpoint=/inventario/...` here and the
//! request is replayed server-side.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use inventario_client::{INVENTORY_ENDPOINT, join_path};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};
use url::Url;
use utoipa::{IntoParams, OpenApi};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(proxy_get, proxy_post, proxy_put, proxy_delete))]
pub struct ProxyApi;

const DEFAULT_SKIP: &str = "0";
const DEFAULT_LIMIT: &str = "100";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/proxy",
            get(proxy_get)
                .post(proxy_post)
                .put(proxy_put)
                .delete(proxy_delete),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProxyQuery {
    /// Backend path, default `/inventario/`.
    pub endpoint: Option<String>,
    /// Forwarded on GET, default `0`.
    pub skip: Option<String>,
    /// Forwarded on GET, default `100`.
    pub limit: Option<String>,
}

fn bad_endpoint(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn proxy_error(details: String) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": "Proxy error",
            "details": details,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

/// Upstream URL for `query`.  Only backend-relative paths are accepted.
fn upstream_url(state: &AppState, query: &ProxyQuery, with_paging: bool) -> Result<Url, Response> {
    let endpoint = query
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(INVENTORY_ENDPOINT);
    if !endpoint.starts_with('/') || endpoint.starts_with("//") || endpoint.contains("://") {
        return Err(bad_endpoint(format!("Invalid endpoint: {endpoint}")));
    }

    let mut url = Url::parse(&join_path(&state.config.api_base_url, endpoint))
        .map_err(|e| bad_endpoint(format!("Invalid endpoint: {e}")))?;
    if with_paging {
        url.query_pairs_mut()
            .append_pair("skip", query.skip.as_deref().unwrap_or(DEFAULT_SKIP))
            .append_pair("limit", query.limit.as_deref().unwrap_or(DEFAULT_LIMIT));
    }
    Ok(url)
}

async fn forward(state: &AppState, method: Method, url: Url, body: Option<Value>, ok: StatusCode) -> Response {
    info!(%method, %url, "proxying request");
    let mut req = state
        .http
        .request(method.clone(), url.clone())
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(body) = &body {
        req = req.json(body);
    }

    let resp = match req.send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(%method, %url, error = %e, "upstream unreachable");
            return proxy_error(e.to_string());
        }
    };

    let status = resp.status();
    if !status.is_success() {
        let details = resp.text().await.unwrap_or_default();
        warn!(%method, %url, status = status.as_u16(), "upstream returned an error");
        let error = format!(
            "External API error: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        return (status, Json(json!({ "error": error.trim_end(), "details": details }))).into_response();
    }
    if status == StatusCode::NO_CONTENT {
        return StatusCode::NO_CONTENT.into_response();
    }

    match resp.json::<Value>().await {
        Ok(data) => (ok, Json(data)).into_response(),
        Err(e) => proxy_error(format!("invalid upstream body: {e}")),
    }
}

/// Forward a list or read request.
#[utoipa::path(
    get,
    path = "/api/proxy",
    tag = "proxy",
    params(ProxyQuery),
    responses(
        (status = 200, description = "Upstream JSON body", body = Value),
        (status = 502, description = "Upstream unreachable", body = Value),
    )
)]
pub async fn proxy_get(State(state): State<Arc<AppState>>, Query(query): Query<ProxyQuery>) -> Response {
    match upstream_url(&state, &query, true) {
        Ok(url) => forward(&state, Method::GET, url, None, StatusCode::OK).await,
        Err(resp) => resp,
    }
}

/// Forward a create request.
#[utoipa::path(
    post,
    path = "/api/proxy",
    tag = "proxy",
    params(ProxyQuery),
    request_body = Value,
    responses(
        (status = 201, description = "Created record", body = Value),
        (status = 502, description = "Upstream unreachable", body = Value),
    )
)]
pub async fn proxy_post(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
    Json(body): Json<Value>,
) -> Response {
    match upstream_url(&state, &query, false) {
        Ok(url) => forward(&state, Method::POST, url, Some(body), StatusCode::CREATED).await,
        Err(resp) => resp,
    }
}

/// Forward an update request.
#[utoipa::path(
    put,
    path = "/api/proxy",
    tag = "proxy",
    params(ProxyQuery),
    request_body = Value,
    responses(
        (status = 200, description = "Updated record", body = Value),
        (status = 502, description = "Upstream unreachable", body = Value),
    )
)]
pub async fn proxy_put(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
    Json(body): Json<Value>,
) -> Response {
    match upstream_url(&state, &query, false) {
        Ok(url) => forward(&state, Method::PUT, url, Some(body), StatusCode::OK).await,
        Err(resp) => resp,
    }
}

/// Forward a delete request.  An upstream 204 is passed through empty.
#[utoipa::path(
    delete,
    path = "/api/proxy",
    tag = "proxy",
    params(ProxyQuery),
    responses(
        (status = 200, description = "Deleted record", body = Value),
        (status = 204, description = "Deleted, no content"),
        (status = 502, description = "Upstream unreachable", body = Value),
    )
)]
pub async fn proxy_delete(State(state): State<Arc<AppState>>, Query(query): Query<ProxyQuery>) -> Response {
    match upstream_url(&state, &query, false) {
        Ok(url) => forward(&state, Method::DELETE, url, None, StatusCode::OK).await,
        Err(resp) => resp,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
