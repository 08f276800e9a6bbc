//! Dashboard inventory routes: role-filtered listing with demo fallback,
//! statistics, selector options, the criticality chart and a connectivity
//! probe.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use inventario_client::{Listing, ProbeReport};
use inventario_types::filter::distinct_options;
use inventario_types::{CriticalityBreakdown, FilterOptions, InventoryQuery, InventoryStats, Notice};
use serde::Serialize;
use tracing::info;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::session::CurrentSession;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_inventory, inventory_stats, filter_choices, criticality_chart, probe_backend))]
pub struct InventoryApi;

/// Rows requested by the connectivity probe.
const PROBE_LIMIT: u32 = 5;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/inventory", get(list_inventory))
        .route("/api/inventory/stats", get(inventory_stats))
        .route("/api/inventory/options", get(filter_choices))
        .route("/api/inventory/criticality", get(criticality_chart))
        .route("/api/inventory/probe", get(probe_backend))
}

#[derive(Debug, Serialize)]
pub struct InventoryPage {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Values offered by the category and supplier selectors.
#[derive(Debug, Serialize)]
pub struct FilterChoices {
    pub categories: Vec<String>,
    pub suppliers: Vec<String>,
}

/// One table page for the caller's role.
///
/// Role visibility and the table filters in the query string narrow the
/// whole inventory first; `skip`/`limit` then pick the page and `total`
/// counts every matching row.  Falls back to the demo dataset when the
/// backend is unavailable.
#[utoipa::path(
    get,
    path = "/api/inventory",
    tag = "inventory",
    params(
        ("skip" = Option<u32>, Query, description = "Rows to skip"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("authorization" = String, Header, description = "Bearer login token"),
    ),
    responses(
        (status = 200, description = "Inventory page", body = serde_json::Value),
        (status = 401, description = "Missing or expired token"),
    )
)]
pub async fn list_inventory(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(page): Query<InventoryQuery>,
    Query(filters): Query<FilterOptions>,
) -> Json<InventoryPage> {
    let listing = state.inventory.list_visible(page, &session, &filters).await;
    info!(
        role = %session.role,
        rows = listing.items.len(),
        total = listing.total,
        filters = filters.active_count(),
        demo = listing.demo_mode,
        "inventory page served"
    );
    let notice = listing.notice();
    Json(InventoryPage { listing, notice })
}

/// Dashboard statistics over everything the caller may see.
#[utoipa::path(
    get,
    path = "/api/inventory/stats",
    tag = "inventory",
    params(("authorization" = String, Header, description = "Bearer login token")),
    responses(
        (status = 200, description = "Inventory statistics", body = serde_json::Value),
        (status = 401, description = "Missing or expired token"),
    )
)]
pub async fn inventory_stats(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Json<InventoryStats> {
    let listing = state.inventory.list_visible(InventoryQuery::all(), &session, &FilterOptions::default()).await;
    Json(InventoryStats::compute(&listing.items))
}

/// Distinct categories and suppliers among the caller's items.
#[utoipa::path(
    get,
    path = "/api/inventory/options",
    tag = "inventory",
    params(("authorization" = String, Header, description = "Bearer login token")),
    responses(
        (status = 200, description = "Selector values", body = serde_json::Value),
        (status = 401, description = "Missing or expired token"),
    )
)]
pub async fn filter_choices(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Json<FilterChoices> {
    let listing = state.inventory.list_visible(InventoryQuery::all(), &session, &FilterOptions::default()).await;
    let (categories, suppliers) = distinct_options(&listing.items);
    Json(FilterChoices { categories, suppliers })
}

/// Criticality histogram of the caller's assets.
#[utoipa::path(
    get,
    path = "/api/inventory/criticality",
    tag = "inventory",
    params(("authorization" = String, Header, description = "Bearer login token")),
    responses(
        (status = 200, description = "Assets per criticality level", body = serde_json::Value),
        (status = 401, description = "Missing or expired token"),
        (status = 502, description = "Backend unavailable"),
    )
)]
pub async fn criticality_chart(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<CriticalityBreakdown>, ServerError> {
    let assets = session.visible(state.inventory.list_all().await?);
    Ok(Json(CriticalityBreakdown::compute(&assets)))
}

/// Time a small request against the backend.
#[utoipa::path(
    get,
    path = "/api/inventory/probe",
    tag = "inventory",
    responses((status = 200, description = "Probe result", body = serde_json::Value))
)]
pub async fn probe_backend(State(state): State<Arc<AppState>>) -> Json<ProbeReport> {
    Json(state.inventory.probe(PROBE_LIMIT).await)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::routes::test_support::{body_json, dead_addr, login, send};
    use axum::http::{Method, StatusCode};
    use inventario_types::{Asset, AssetFields, Role};
    use serde_json::json;
    use std::net::SocketAddr;

    fn owned(id: i64, owner: &str, rating: &str) -> Asset {
        Asset::new(
            id,
            AssetFields {
                name: Some(format!("Activo {id}")),
                owner: Some(owner.into()),
                availability: Some(rating.into()),
                criticality: Some(rating.into()),
                process: Some(if id == 1 { "Gestión TI" } else { "Control" }.into()),
                ..Default::default()
            },
        )
    }

    async fn spawn_backend() -> SocketAddr {
        let office = Role::InternalControl.to_string();
        let assets = vec![
            owned(1, "admin", "Alta"),
            owned(2, &office, "Media"),
            owned(3, &office, "Alta"),
        ];
        let app = Router::new().route(
            "/inventario/",
            get(move |Query(q): Query<InventoryQuery>| {
                let assets = assets.clone();
                async move { Json(q.slice(&assets)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn state_for(addr: SocketAddr) -> Arc<AppState> {
        Arc::new(AppState::new(Config {
            api_base_url: format!("http://{addr}"),
            timeout_ms: 2_000,
            ..Config::default()
        }))
    }

    fn ids(body: &serde_json::Value) -> Vec<&str> {
        body["items"].as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn office_role_sees_only_its_assets() {
        let state = state_for(spawn_backend().await);
        let office = login(&state, "jefe_oficina", "jefe123").await;
        let resp = send(state, Method::GET, "/api/inventory", None, &[("authorization", &office)]).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(ids(&body), ["2", "3"]);
        assert_eq!(body["total"], 2);
        assert_eq!(body["demoMode"], false);
        assert!(body.get("notice").is_none());
    }

    #[tokio::test]
    async fn office_pages_are_cut_after_the_role_filter() {
        let state = state_for(spawn_backend().await);
        let office = login(&state, "jefe_oficina", "jefe123").await;
        let headers = [("authorization", office.as_str())];

        let body = body_json(send(state.clone(), Method::GET, "/api/inventory?skip=0&limit=1", None, &headers).await).await;
        assert_eq!(ids(&body), ["2"]);
        assert_eq!(body["total"], 2);

        let body = body_json(send(state, Method::GET, "/api/inventory?skip=1&limit=1", None, &headers).await).await;
        assert_eq!(ids(&body), ["3"]);
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn status_filter_counts_every_match() {
        let state = state_for(spawn_backend().await);
        let admin = login(&state, "admin", "admin123").await;
        let resp = send(state, Method::GET, "/api/inventory?status=low-stock", None, &[("authorization", &admin)]).await;
        let body = body_json(resp).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["id"], "2");
    }

    #[tokio::test]
    async fn unavailable_backend_serves_demo_page() {
        let state = state_for(dead_addr().await);
        let office = login(&state, "jefe_oficina", "jefe123").await;
        let resp = send(state, Method::GET, "/api/inventory?skip=0&limit=2", None, &[("authorization", &office)]).await;
        let body = body_json(resp).await;
        assert_eq!(body["demoMode"], true);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["total"], 6);
        assert_eq!(body["notice"]["level"], "info");
    }

    #[tokio::test]
    async fn role_header_without_token_is_unauthorized() {
        let state = state_for(dead_addr().await);
        let resp = send(state, Method::GET, "/api/inventory", None, &[("x-user-role", "admin")]).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "missing bearer token");
    }

    #[tokio::test]
    async fn criticality_chart_counts_visible_assets() {
        let state = state_for(spawn_backend().await);
        let office = login(&state, "jefe_oficina", "jefe123").await;
        let body = body_json(send(state.clone(), Method::GET, "/api/inventory/criticality", None, &[("authorization", &office)]).await).await;
        assert_eq!(body, json!({"alto": 1, "medio": 1, "bajo": 0, "unknown": 0}));

        let admin = login(&state, "admin", "admin123").await;
        let body = body_json(send(state, Method::GET, "/api/inventory/criticality", None, &[("authorization", &admin)]).await).await;
        assert_eq!(body["alto"], 2);
    }

    #[tokio::test]
    async fn criticality_chart_reports_backend_failure() {
        let state = state_for(dead_addr().await);
        let admin = login(&state, "admin", "admin123").await;
        let resp = send(state, Method::GET, "/api/inventory/criticality", None, &[("authorization", &admin)]).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn filter_choices_come_from_demo_rows_when_offline() {
        let state = state_for(dead_addr().await);
        let admin = login(&state, "admin", "admin123").await;
        let body = body_json(send(state, Method::GET, "/api/inventory/options", None, &[("authorization", &admin)]).await).await;
        let categories: Vec<&str> = body["categories"].as_array().unwrap().iter().map(|c| c.as_str().unwrap()).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        sorted.dedup();
        assert!(!categories.is_empty());
        assert_eq!(categories, sorted);
    }

    #[tokio::test]
    async fn probe_reports_failure_without_erroring() {
        let state = state_for(dead_addr().await);
        let body = body_json(send(state, Method::GET, "/api/inventory/probe", None, &[]).await).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["count"], json!(0));
        assert!(body["error"].is_string());
    }
}
