use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::ProviderSelection;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProviderConfigRequest {
    pub llm_provider: Option<String>,
    pub embedding_provider: Option<String>,
    pub vectordb_provider: Option<String>,
}

pub async fn get_providers(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let selection = state.selection().await;
    Ok(Json(json!({
        "llm_provider": selection.llm_provider,
        "embedding_provider": selection.embedding_provider,
        "vectordb_provider": selection.vectordb_provider,
        "llm_model": state.settings.llm_model,
        "embedding_model": state.settings.embedding_model,
    })))
}

/// Administrative: rebuilds the orchestrator with the requested providers.
/// Applies to subsequent requests only; in-flight requests keep the triple
/// they started with.
pub async fn configure_providers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ProviderConfigRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.authorize_bearer(&headers).await?;

    let current = state.selection().await;
    let requested = ProviderSelection {
        llm_provider: payload.llm_provider.unwrap_or(current.llm_provider),
        embedding_provider: payload
            .embedding_provider
            .unwrap_or(current.embedding_provider),
        vectordb_provider: payload
            .vectordb_provider
            .unwrap_or(current.vectordb_provider),
    };

    let applied = state.reconfigure(requested).await?;

    Ok(Json(json!({
        "message": "Providers updated successfully",
        "config": applied,
        "note": "Configuration will be applied to new requests. Existing connections remain unchanged.",
    })))
}

pub async fn reset_providers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.authorize_bearer(&headers).await?;

    let applied = state
        .reconfigure(state.settings.default_selection())
        .await?;

    Ok(Json(json!({
        "message": "Providers reset to default configuration",
        "config": applied,
    })))
}
