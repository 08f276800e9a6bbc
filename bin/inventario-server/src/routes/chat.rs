//! Inventory assistant routes.
//!
//! A conversation is addressed by id and belongs to the user who started
//! it.  Each `POST /api/chat` carries one
//! command: select an action, send text for the selected action, go back to
//! the menu, or reset the transcript.  Turns on the same conversation are
//! serialized; different conversations run concurrently.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use inventario_agent::{ChatState, Chatbot};
use inventario_types::{ChatAction, ChatMessage, Notice};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::ServerError;
use crate::middleware::session::CurrentSession;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(post_chat, get_chat))]
pub struct ChatApi;

const MAX_CONVERSATION_ID: usize = 64;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat", post(post_chat))
        .route("/api/chat/{id}", get(get_chat))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Omit to start a new conversation.
    pub conversation_id: Option<String>,
    #[serde(flatten)]
    pub command: ChatCommand,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ChatCommand {
    Select { action: ChatAction },
    Send { text: String },
    Menu,
    Reset,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub conversation_id: String,
    pub state: ChatState,
    /// New messages for `send`, the whole transcript otherwise.
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    /// How a `send` turn ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<ChatState>,
}

fn chatbot(state: &AppState) -> Result<&Chatbot, ServerError> {
    state
        .chatbot
        .as_ref()
        .ok_or_else(|| ServerError::Unavailable("assistant disabled: GEMINI_API_KEY is not set".into()))
}

fn conversation_id(requested: Option<String>) -> Result<String, ServerError> {
    match requested {
        None => Ok(Uuid::new_v4().to_string()),
        Some(id) if id.is_empty() || id.len() > MAX_CONVERSATION_ID => {
            Err(ServerError::BadRequest(format!("conversation id must be 1..={MAX_CONVERSATION_ID} bytes")))
        }
        Some(id) => Ok(id),
    }
}

/// Run one chat command.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = serde_json::Value,
    params(("authorization" = String, Header, description = "Bearer login token")),
    responses(
        (status = 200, description = "Conversation after the command", body = serde_json::Value),
        (status = 400, description = "Invalid command or blank text"),
        (status = 401, description = "Missing or expired token"),
        (status = 409, description = "Command not allowed in the current state"),
        (status = 503, description = "Assistant disabled"),
    )
)]
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let bot = chatbot(&state)?;
    let id = conversation_id(req.conversation_id)?;
    let conversation = state.conversations.get_or_open(&session.username, &id).await?;
    let mut chat = conversation.lock().await;

    let (notice, turn, appended) = match req.command {
        ChatCommand::Select { action } => {
            chat.select_action(action).await?;
            (None, None, None)
        }
        ChatCommand::Send { text } => {
            let outcome = chat.submit(&text, bot, &state.inventory, &session).await?;
            info!(conversation = %id, turn = %outcome.state, "chat turn finished");
            (outcome.notice, Some(outcome.state), Some(outcome.appended))
        }
        ChatCommand::Menu => {
            chat.back_to_menu().await?;
            (None, None, None)
        }
        ChatCommand::Reset => {
            chat.reset().await?;
            (None, None, None)
        }
    };

    Ok(Json(ChatResponse {
        conversation_id: id,
        state: chat.state(),
        messages: appended.unwrap_or_else(|| chat.messages().to_vec()),
        notice,
        turn,
    }))
}

/// Current state and transcript of a conversation.
#[utoipa::path(
    get,
    path = "/api/chat/{id}",
    tag = "chat",
    params(
        ("id" = String, Path, description = "Conversation id"),
        ("authorization" = String, Header, description = "Bearer login token"),
    ),
    responses(
        (status = 200, description = "Conversation", body = serde_json::Value),
        (status = 401, description = "Missing or expired token"),
        (status = 404, description = "No such conversation for this user"),
        (status = 503, description = "Assistant disabled"),
    )
)]
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ChatResponse>, ServerError> {
    chatbot(&state)?;
    let id = conversation_id(Some(id))?;
    let conversation = state
        .conversations
        .get(&session.username, &id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("conversation {id} not found")))?;
    let chat = conversation.lock().await;
    Ok(Json(ChatResponse {
        conversation_id: id,
        state: chat.state(),
        messages: chat.messages().to_vec(),
        notice: None,
        turn: None,
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
