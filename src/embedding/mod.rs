pub mod gemini;
pub mod llamacpp;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

pub use provider::EmbeddingProvider;

use crate::core::config::Settings;
use crate::core::errors::ApiError;

use gemini::GeminiEmbedding;
use llamacpp::LlamaCppEmbedding;

/// Constructs the embedding variant named by `name`.
pub fn create(name: &str, settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>, ApiError> {
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    match name {
        "gemini" => {
            let api_key = settings
                .gemini_api_key
                .clone()
                .ok_or_else(|| ApiError::Configuration("GEMINI_API_KEY is not set".to_string()))?;
            Ok(Arc::new(GeminiEmbedding::new(
                api_key,
                settings.embedding_model.clone(),
                timeout,
            )?))
        }
        "llamacpp" => Ok(Arc::new(LlamaCppEmbedding::new(
            settings.llamacpp_base_url.clone(),
            settings.embedding_model.clone(),
            timeout,
        )?)),
        other => Err(ApiError::UnknownProvider {
            capability: "embedding",
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_rejects_unknown_names() {
        let err = create("cohere", &Settings::default()).unwrap_err();
        assert!(err.to_string().contains("cohere"));
    }

    #[test]
    fn local_variant_constructs_without_credentials() {
        let provider = create("llamacpp", &Settings::default()).unwrap();
        assert_eq!(provider.name(), "llamacpp");
    }
}
