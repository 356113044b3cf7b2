use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{text_or_fallback, LlmProvider};
use crate::core::errors::ApiError;

/// Locally hosted model variant, speaking the OpenAI-compatible chat API
/// exposed by llama.cpp's server (and LM Studio).
#[derive(Clone, Debug)]
pub struct LlamaCppLlm {
    base_url: String,
    client: Client,
}

impl LlamaCppLlm {
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
impl LlmProvider for LlamaCppLlm {
    fn name(&self) -> &'static str {
        "llamacpp"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "temperature": 0.2,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::provider)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "llama.cpp chat error: {}",
                text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::provider)?;
        let content = payload["choices"][0]["message"]["content"].as_str();

        Ok(text_or_fallback(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;

    // Requires a llama.cpp server (or LM Studio) listening locally.
    #[tokio::test]
    #[ignore]
    async fn live_llamacpp_generate() {
        let provider =
            LlamaCppLlm::new("http://127.0.0.1:8088".to_string(), Duration::from_secs(60))
                .unwrap();
        let answer = provider.generate("Say hello in one word.").await.unwrap();
        println!("llama.cpp answer: {}", answer);
        assert!(!answer.is_empty());
    }
}
