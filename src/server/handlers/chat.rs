use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

fn default_top_k() -> usize {
    3
}

fn default_history_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub conversation_id: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: String,
    pub message: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

pub async fn query_rag(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rag = state.rag().await;
    let answer = rag
        .query(
            &payload.question,
            payload.conversation_id.as_deref(),
            payload.top_k,
        )
        .await?;

    Ok(Json(json!({
        "answer": answer,
        "conversation_id": payload.conversation_id,
    })))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rag = state.rag().await;
    let outcome = rag
        .chat(
            &payload.conversation_id,
            &payload.message,
            payload.top_k,
            payload.history_limit,
        )
        .await?;

    Ok(Json(json!({
        "conversation_id": payload.conversation_id,
        "user_message_id": outcome.user_message_id,
        "assistant_message_id": outcome.assistant_message_id,
        "answer": outcome.answer,
    })))
}
