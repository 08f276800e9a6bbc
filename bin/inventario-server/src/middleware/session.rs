//! The caller's session, resolved from the login token.
//!
//! `POST /api/auth/login` issues a token; every dashboard route expects it
//! back as `Authorization: Bearer <token>`.  The role always comes from the
//! server-side session, never from the request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use inventario_types::Session;

use crate::error::ServerError;
use crate::state::AppState;

/// Extractor wrapping the caller's [`Session`].
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| ServerError::Unauthorized("missing bearer token".into()))?;
        state
            .sessions
            .resolve(token)
            .await
            .map(CurrentSession)
            .ok_or_else(|| ServerError::Unauthorized("invalid or expired session".into()))
    }
}
