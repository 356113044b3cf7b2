use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::core::errors::ApiError;
use crate::services::{PredictionInput, PredictionService};
use crate::state::AppState;

fn prediction_service(state: &AppState) -> Result<&PredictionService, ApiError> {
    state.prediction.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("prediction model is not loaded".to_string())
    })
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PredictionInput>,
) -> Result<impl IntoResponse, ApiError> {
    let output = prediction_service(&state)?.predict(payload).await?;
    Ok(Json(output))
}

pub async fn list_predictions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let history = prediction_service(&state)?.history().await?;
    Ok(Json(history))
}
