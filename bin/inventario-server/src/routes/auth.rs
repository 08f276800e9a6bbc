//! Login routes.
//!
//! A successful login returns a token; the dashboard sends it back as
//! `Authorization: Bearer <token>` on every inventory, chat and report call.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use inventario_types::{Permissions, Role, Session};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::session::CurrentSession;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(login, logout, current_session))]
pub struct AuthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(current_session))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Only set in the login answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub username: String,
    pub role: Role,
    pub role_description: &'static str,
    pub permissions: Permissions,
}

impl SessionView {
    fn of(session: &Session) -> Self {
        Self {
            token: None,
            username: session.username.clone(),
            role: session.role,
            role_description: session.role.description(),
            permissions: session.role.permissions(),
        }
    }
}

/// Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Session token, role and permissions", body = serde_json::Value),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionView>, ServerError> {
    let Some(session) = state.sessions.login(req.username.trim(), &req.password).await else {
        warn!(username = %req.username, "login rejected");
        return Err(ServerError::Unauthorized("Credenciales inválidas".into()));
    };
    info!(username = %session.username, role = %session.role, "user logged in");
    Ok(Json(SessionView { token: Some(session.token.clone()), ..SessionView::of(&session) }))
}

/// End the caller's session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    params(("authorization" = String, Header, description = "Bearer login token")),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Missing or expired token"),
    )
)]
pub async fn logout(State(state): State<Arc<AppState>>, CurrentSession(session): CurrentSession) -> StatusCode {
    state.sessions.logout(&session.token).await;
    info!(username = %session.username, "user logged out");
    StatusCode::NO_CONTENT
}

/// The caller's role and permissions.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    params(("authorization" = String, Header, description = "Bearer login token")),
    responses(
        (status = 200, description = "Current session", body = serde_json::Value),
        (status = 401, description = "Missing or expired token"),
    )
)]
pub async fn current_session(CurrentSession(session): CurrentSession) -> Json<SessionView> {
    Json(SessionView::of(&session))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::routes::test_support::{body_json, send};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn login_me_logout() {
        let state = Arc::new(AppState::new(Config::default()));
        let body = json!({"username": "oficina_control", "password": "control123"});
        let resp = send(state.clone(), Method::POST, "/api/auth/login", Some(body), &[]).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["role"], "Oficina de Control Disciplinario Interno");
        assert_eq!(body["permissions"]["canDelete"], false);
        let bearer = format!("Bearer {}", body["token"].as_str().unwrap());

        let me = body_json(send(state.clone(), Method::GET, "/api/auth/me", None, &[("authorization", &bearer)]).await).await;
        assert_eq!(me["username"], "oficina_control");
        assert!(me.get("token").is_none());

        let resp = send(state.clone(), Method::POST, "/api/auth/logout", None, &[("authorization", &bearer)]).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = send(state, Method::GET, "/api/auth/me", None, &[("authorization", &bearer)]).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let state = Arc::new(AppState::new(Config::default()));
        let body = json!({"username": "admin", "password": "admin"});
        let resp = send(state.clone(), Method::POST, "/api/auth/login", Some(body), &[]).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "Credenciales inválidas");
        assert_eq!(state.sessions.len().await, 0);
    }
}
