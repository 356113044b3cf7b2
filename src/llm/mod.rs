pub mod gemini;
pub mod llamacpp;
pub mod ngrok;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

pub use provider::{LlmProvider, FALLBACK_ANSWER};

use crate::core::config::Settings;
use crate::core::errors::ApiError;

use gemini::GeminiLlm;
use llamacpp::LlamaCppLlm;
use ngrok::NgrokLlm;

/// Constructs the LLM variant named by `name`. Pure name dispatch: credential
/// and connectivity problems surface from the variant, not from here.
pub fn create(name: &str, settings: &Settings) -> Result<Arc<dyn LlmProvider>, ApiError> {
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    match name {
        "gemini" => {
            let api_key = settings
                .gemini_api_key
                .clone()
                .ok_or_else(|| ApiError::Configuration("GEMINI_API_KEY is not set".to_string()))?;
            Ok(Arc::new(GeminiLlm::new(
                api_key,
                settings.llm_model.clone(),
                timeout,
            )?))
        }
        "llamacpp" => Ok(Arc::new(LlamaCppLlm::new(
            settings.llamacpp_base_url.clone(),
            timeout,
        )?)),
        "ngrok" => {
            let url = settings
                .ngrok_url
                .clone()
                .ok_or_else(|| ApiError::Configuration("ngrok_url is not set".to_string()))?;
            Ok(Arc::new(NgrokLlm::new(url, timeout)?))
        }
        other => Err(ApiError::UnknownProvider {
            capability: "llm",
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_rejects_unknown_names() {
        let settings = Settings::default();
        let err = create("openai", &settings).unwrap_err();
        assert!(matches!(
            err,
            ApiError::UnknownProvider {
                capability: "llm",
                ..
            }
        ));
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn gemini_requires_an_api_key() {
        let settings = Settings {
            gemini_api_key: None,
            ..Settings::default()
        };
        assert!(matches!(
            create("gemini", &settings),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn local_and_tunnel_variants_construct() {
        let settings = Settings {
            ngrok_url: Some("https://example.ngrok-free.app".to_string()),
            ..Settings::default()
        };
        assert_eq!(create("llamacpp", &settings).unwrap().name(), "llamacpp");
        assert_eq!(create("ngrok", &settings).unwrap().name(), "ngrok");
    }
}
