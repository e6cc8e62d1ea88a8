//! REST endpoints for validation, red-flag chat and pre-screening chat.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::intake::{ApplicationData, ConversationMessage, RedFlag};

pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/validate", post(validate))
        .route("/api/chat/message", post(chat_message))
        .route("/api/prescreening/chat", post(prescreening_chat))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub red_flags: Vec<RedFlag>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub message: String,
    pub red_flag: RedFlag,
    pub application_data: ApplicationData,
    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreScreeningChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,
}

// ── Health ──────────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "ChatForm API is running"
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy"}))
}

// ── Validation ──────────────────────────────────────────────────────────

async fn validate(
    State(state): State<AppState>,
    Json(application): Json<ApplicationData>,
) -> impl IntoResponse {
    let red_flags = state.service.validate(&application).await;
    info!(count = red_flags.len(), "Validation finished");
    Json(ValidationResponse { red_flags })
}

// ── Chat ────────────────────────────────────────────────────────────────

async fn chat_message(
    State(state): State<AppState>,
    Json(body): Json<ChatMessageRequest>,
) -> impl IntoResponse {
    let reply = state
        .service
        .resolve_red_flag(
            &body.message,
            &body.red_flag,
            &body.application_data,
            &body.conversation_history,
        )
        .await;
    Json(reply)
}

async fn prescreening_chat(
    State(state): State<AppState>,
    Json(body): Json<PreScreeningChatRequest>,
) -> impl IntoResponse {
    let reply = state
        .service
        .prescreening_reply(&body.message, &body.conversation_history)
        .await;
    Json(reply)
}
