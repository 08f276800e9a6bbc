//! Report routes: the AI report over the dashboard view and the filtered
//! asset report over raw records.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use inventario_agent::{Report, query_suggestions};
use inventario_types::{Asset, AssetFilter, CriticalityBreakdown, FilterOptions, InventoryQuery, Notice};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::session::CurrentSession;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(create_report, list_suggestions, asset_report))]
pub struct ReportApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/report", post(create_report))
        .route("/api/report/suggestions", get(list_suggestions))
        .route("/api/report/assets", get(asset_report))
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: Report,
    /// The report was built from demonstration data.
    pub demo_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Serialize)]
pub struct AssetReport {
    /// Matching assets before `offset`/`limit`.
    pub total: usize,
    /// Histogram over every matching asset.
    pub criticality: CriticalityBreakdown,
    pub assets: Vec<Asset>,
}

/// Filter the caller's inventory with a natural-language query.
#[utoipa::path(
    post,
    path = "/api/report",
    tag = "report",
    request_body = serde_json::Value,
    params(("authorization" = String, Header, description = "Bearer login token")),
    responses(
        (status = 200, description = "Generated report", body = serde_json::Value),
        (status = 400, description = "Query too short, too long, or no data"),
        (status = 401, description = "Missing or expired token"),
        (status = 502, description = "Model unavailable or unusable answer"),
        (status = 503, description = "Reports disabled"),
    )
)]
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ServerError> {
    let reports = state
        .reports
        .as_ref()
        .ok_or_else(|| ServerError::Unavailable("reports disabled: GEMINI_API_KEY is not set".into()))?;

    let listing = state.inventory.list_visible(InventoryQuery::all(), &session, &FilterOptions::default()).await;
    let report = reports.generate(&req.query, &listing.items).await?;
    info!(
        role = %session.role,
        records = report.filtered_products.len(),
        demo = listing.demo_mode,
        "report served"
    );

    Ok(Json(ReportResponse { notice: listing.notice(), demo_mode: listing.demo_mode, report }))
}

/// Example queries for the report form.
#[utoipa::path(
    get,
    path = "/api/report/suggestions",
    tag = "report",
    responses((status = 200, description = "Suggested queries", body = [String]))
)]
pub async fn list_suggestions() -> Json<&'static [&'static str]> {
    Json(query_suggestions())
}

/// Assets matching exact type/process filters and rating substrings, with
/// `offset`/`limit` paging.
#[utoipa::path(
    get,
    path = "/api/report/assets",
    tag = "report",
    params(
        ("assetType" = Option<String>, Query, description = "Exact asset type, `all` for any"),
        ("process" = Option<String>, Query, description = "Exact process, `all` for any"),
        ("criticality" = Option<String>, Query, description = "Case-insensitive substring"),
        ("offset" = Option<usize>, Query, description = "Matches to skip"),
        ("limit" = Option<usize>, Query, description = "Matches to return"),
        ("authorization" = String, Header, description = "Bearer login token"),
    ),
    responses(
        (status = 200, description = "Filtered assets", body = serde_json::Value),
        (status = 401, description = "Missing or expired token"),
        (status = 502, description = "Backend unavailable"),
    )
)]
pub async fn asset_report(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<AssetFilter>,
) -> Result<Json<AssetReport>, ServerError> {
    let matching: Vec<Asset> = session
        .visible(state.inventory.list_all().await?)
        .into_iter()
        .filter(|a| filter.matches(a))
        .collect();
    let assets = filter.apply(&matching);
    info!(role = %session.role, total = matching.len(), returned = assets.len(), "asset report served");
    Ok(Json(AssetReport { total: matching.len(), criticality: CriticalityBreakdown::compute(&matching), assets }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::routes::test_support::{ScriptedModel, body_json, dead_addr, login, send};
    use axum::http::{Method, StatusCode};
    use inventario_types::{AssetFields, Role};
    use serde_json::json;
    use std::net::SocketAddr;

    async fn state_with(answers: &[&str]) -> Arc<AppState> {
        let config = Config { api_base_url: format!("http://{}", dead_addr().await), timeout_ms: 500, ..Config::default() };
        Arc::new(AppState::with_model(config, Some(ScriptedModel::new(answers))))
    }

    async fn admin(state: &Arc<AppState>) -> String {
        login(state, "admin", "admin123").await
    }

    #[tokio::test]
    async fn report_over_demo_data() {
        let answer = r#"```json
{"filteredProducts": [{"id": "1", "name": "Servidor", "category": "Hardware", "quantity": 10,
  "minStock": 5, "price": 0, "supplier": "admin", "lastUpdated": "2025-01-01", "status": "in-stock"}],
 "reportTitle": "Activos críticos"}
```"#;
        let state = state_with(&[answer]).await;
        let auth = admin(&state).await;
        let resp = send(state, Method::POST, "/api/report", Some(json!({"query": "activos críticos"})), &[("authorization", &auth)]).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["reportTitle"], "Activos críticos");
        assert_eq!(body["reportDescription"], "Reporte generado con IA");
        assert_eq!(body["filteredProducts"][0]["name"], "Servidor");
        assert_eq!(body["demoMode"], true);
        assert_eq!(body["notice"]["level"], "info");
    }

    #[tokio::test]
    async fn short_query_is_rejected() {
        let state = state_with(&[]).await;
        let auth = admin(&state).await;
        let resp = send(state, Method::POST, "/api/report", Some(json!({"query": "abc"})), &[("authorization", &auth)]).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].as_str().unwrap().contains("5"));
    }

    #[tokio::test]
    async fn model_without_answer_is_bad_gateway() {
        let state = state_with(&[]).await;
        let auth = admin(&state).await;
        let resp = send(state, Method::POST, "/api/report", Some(json!({"query": "activos críticos"})), &[("authorization", &auth)]).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn disabled_without_model_key() {
        let state = Arc::new(AppState::new(Config::default()));
        let auth = admin(&state).await;
        let resp = send(state, Method::POST, "/api/report", Some(json!({"query": "activos críticos"})), &[("authorization", &auth)]).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn report_requires_login() {
        let state = state_with(&[]).await;
        let resp = send(state, Method::POST, "/api/report", Some(json!({"query": "activos críticos"})), &[]).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn suggestions_are_listed() {
        let state = state_with(&[]).await;
        let body = body_json(send(state, Method::GET, "/api/report/suggestions", None, &[]).await).await;
        assert_eq!(body.as_array().unwrap().len(), 7);
    }

    async fn spawn_backend() -> SocketAddr {
        let office = Role::FinanceAdministration.to_string();
        let assets: Vec<Asset> = (1..=5)
            .map(|id| {
                Asset::new(
                    id,
                    AssetFields {
                        name: Some(format!("Activo {id}")),
                        owner: Some(if id == 5 { "admin".into() } else { office.clone() }),
                        process: Some(if id % 2 == 0 { "Financiera" } else { "TI" }.into()),
                        criticality: Some(if id <= 3 { "ALTO" } else { "Bajo" }.into()),
                        ..Default::default()
                    },
                )
            })
            .collect();
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

    #[tokio::test]
    async fn asset_report_filters_visible_records() {
        let config = Config { api_base_url: format!("http://{}", spawn_backend().await), ..Config::default() };
        let state = Arc::new(AppState::new(config));
        let finance = login(&state, "finanzas", "finanzas123").await;

        let resp = send(state.clone(), Method::GET, "/api/report/assets?process=TI&criticality=alto", None, &[("authorization", &finance)]).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let ids: Vec<i64> = body["assets"].as_array().unwrap().iter().map(|a| a["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(body["total"], 2);
        assert_eq!(body["criticality"]["alto"], 2);

        let resp = send(state, Method::GET, "/api/report/assets?process=all&offset=1&limit=2", None, &[("authorization", &finance)]).await;
        let body = body_json(resp).await;
        let ids: Vec<i64> = body["assets"].as_array().unwrap().iter().map(|a| a["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, [2, 3]);
        // asset 5 belongs to admin
        assert_eq!(body["total"], 4);
        assert_eq!(body["criticality"], json!({"alto": 3, "medio": 0, "bajo": 1, "unknown": 0}));
    }
}
