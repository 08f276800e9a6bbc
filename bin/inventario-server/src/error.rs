//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body with an
//! appropriate status code.  Transcript store errors are logged in full and
//! only a generic message reaches the caller.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inventario_agent::AgentError;
use inventario_client::ClientError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the chatbot or report generator.
    #[error("assistant error: {0}")]
    Agent(#[from] AgentError),

    /// Propagated from the inventory client.
    #[error("inventory error: {0}")]
    Client(#[from] ClientError),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// No valid login token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A feature is disabled by configuration.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

fn client_status(e: &ClientError) -> StatusCode {
    match e {
        ClientError::Validation(_) => StatusCode::BAD_REQUEST,
        ClientError::Status { status, .. } if (400..500).contains(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        ClientError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),

            ServerError::Client(e) | ServerError::Agent(AgentError::Client(e)) => {
                warn!(error = %e, "inventory backend error");
                (client_status(e), e.to_string())
            }
            ServerError::Agent(e @ (AgentError::InvalidQuery(_) | AgentError::InvalidTransition { .. })) => {
                let status = match e {
                    AgentError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string())
            }
            ServerError::Agent(AgentError::Store(m)) => {
                error!(message = %m, "transcript store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Agent(e) => {
                warn!(error = %e, "language model error");
                (StatusCode::BAD_GATEWAY, e.to_notice().description)
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
