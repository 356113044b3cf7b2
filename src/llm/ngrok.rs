use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{text_or_fallback, LlmProvider};
use crate::core::errors::ApiError;

/// Remote-tunnel variant: a model served from a notebook or lab box behind an
/// ngrok URL, exposing a bare `POST /ask` endpoint.
#[derive(Clone, Debug)]
pub struct NgrokLlm {
    base_url: String,
    client: Client,
}

impl NgrokLlm {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl LlmProvider for NgrokLlm {
    fn name(&self) -> &'static str {
        "ngrok"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let url = format!("{}/ask", self.base_url);

        let body = json!({
            "query": prompt,
            "max_tokens": 300,
            "temperature": 0.7,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "remote LLM error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::provider)?;
        Ok(text_or_fallback(payload["answer"].as_str()))
    }
}
