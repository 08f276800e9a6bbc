use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use inventario_agent::{AgentError, Chatbot, ChatbotReply, GeminiClient, GenerationConfig, GenerativeModel};
use inventario_types::{ChatAction, NoticeLevel};
use serde_json::{Value, json};

#[derive(Default)]
struct Stub {
    status: u16,
    reply: Value,
    calls: Vec<(String, Option<String>, Value)>,
}

type Shared = Arc<Mutex<Stub>>;

#[derive(serde::Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

async fn generate(
    State(stub): State<Shared>,
    Path(call): Path<String>,
    Query(q): Query<KeyQuery>,
    Json(body): Json<Value>,
) -> Response {
    let mut stub = stub.lock().unwrap();
    stub.calls.push((call, q.key, body));
    let status = StatusCode::from_u16(stub.status).unwrap();
    (status, Json(stub.reply.clone())).into_response()
}

async fn spawn_stub(status: u16, reply: Value) -> (SocketAddr, Shared) {
    let stub: Shared = Arc::new(Mutex::new(Stub { status, reply, calls: Vec::new() }));
    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate))
        .with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, stub)
}

fn gemini(addr: SocketAddr) -> GeminiClient {
    GeminiClient::new("test-key").set_endpoint(format!("http://{addr}/v1beta"))
}

fn candidate(text: &str) -> Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
}

#[tokio::test]
async fn test_generate_returns_first_candidate_text() {
    let (addr, stub) = spawn_stub(200, candidate("hola")).await;
    let text = gemini(addr).generate("prompt", &GenerationConfig::CHAT).await.unwrap();
    assert_eq!(text, "hola");

    let stub = stub.lock().unwrap();
    let (call, key, body) = &stub.calls[0];
    assert_eq!(call, "gemini-2.5-pro:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
}

#[tokio::test]
async fn test_non_success_status_is_reported_without_retry() {
    let (addr, stub) = spawn_stub(429, json!({"error": {"message": "quota"}})).await;
    let err = gemini(addr).generate("prompt", &GenerationConfig::CHAT).await.unwrap_err();
    match err {
        AgentError::Status { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("quota"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stub.lock().unwrap().calls.len(), 1);
}

#[tokio::test]
async fn test_missing_candidates_is_empty_response() {
    let (addr, _) = spawn_stub(200, json!({"candidates": []})).await;
    let err = gemini(addr).generate("prompt", &GenerationConfig::CHAT).await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyResponse));
}

#[tokio::test]
async fn test_non_json_success_body_is_invalid_response() {
    let app = Router::new().route("/v1beta/models/{call}", post(|| async { "<html>gateway</html>" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let err = gemini(addr).generate("prompt", &GenerationConfig::CHAT).await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidAiResponse(_)), "{err}");
    assert_eq!(err.to_notice().title, "Respuesta inválida de la IA");
}

#[tokio::test]
async fn test_chatbot_consult_through_stub() {
    let answer = "```json\n{\"message\": \"Hay 2 activos críticos\", \"type\": \"warning\"}\n```";
    let (addr, _) = spawn_stub(200, candidate(answer)).await;
    let bot = Chatbot::new(Arc::new(gemini(addr)));
    let reply = bot.ask(ChatAction::Consult, "¿Cuántos activos críticos hay?", &[]).await.unwrap();
    assert_eq!(
        reply,
        ChatbotReply::Answer { message: "Hay 2 activos críticos".into(), level: NoticeLevel::Warning }
    );
}

#[tokio::test]
async fn test_unreachable_model_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = gemini(addr).generate("prompt", &GenerationConfig::CHAT).await.unwrap_err();
    assert!(matches!(err, AgentError::Network(_)));
}
