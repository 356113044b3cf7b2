use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Error type shared by the service layer and the HTTP layer.
///
/// Variants map onto distinct failure classes so callers can decide what is
/// retryable: `Provider` failures are transient upstream problems, while
/// `Configuration`/`UnknownProvider` are fatal at construction time and
/// `DocumentProcessing` means the input itself is unusable.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unknown {capability} provider: {name}")]
    UnknownProvider {
        capability: &'static str,
        name: String,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("document processing error: {0}")]
    DocumentProcessing(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Provider(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnknownProvider { .. } | ApiError::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
            ApiError::DocumentProcessing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_names_the_invalid_value() {
        let err = ApiError::UnknownProvider {
            capability: "llm",
            name: "openai".to_string(),
        };
        assert_eq!(err.to_string(), "unknown llm provider: openai");
    }
}
