use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub conversation_id: String,
    pub role: String,
    pub content: String,
}

pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = state.conversation_service.create(&payload.title).await?;
    Ok(Json(conversation))
}

pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let conversations = state.conversation_service.list_all().await?;
    Ok(Json(conversations))
}

pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = state.conversation_service.get(&conversation_id).await?;
    Ok(Json(conversation))
}

pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rag = state.rag().await;
    rag.delete_conversation(&conversation_id).await?;
    Ok(Json(json!({ "message": "Conversation deleted successfully" })))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(20);

    let messages = state
        .conversation_service
        .list_messages(&conversation_id, limit)
        .await?;
    Ok(Json(messages))
}

pub async fn add_message(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Json(payload): Json<AddMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.conversation_id != conversation_id {
        return Err(ApiError::BadRequest("conversation_id mismatch".to_string()));
    }

    state
        .conversation_service
        .add_message(&conversation_id, &payload.role, &payload.content)
        .await?;
    Ok(Json(json!({ "message": "Message saved" })))
}
