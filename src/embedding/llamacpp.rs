use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{check_batch_len, EmbeddingProvider};
use crate::core::errors::ApiError;

/// Local embedding variant, speaking the OpenAI-compatible `/v1/embeddings`
/// API of a llama.cpp embedding server.
#[derive(Clone, Debug)]
pub struct LlamaCppEmbedding {
    base_url: String,
    model: String,
    client: Client,
}

impl LlamaCppEmbedding {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LlamaCppEmbedding {
    fn name(&self) -> &'static str {
        "llamacpp"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.model,
            "input": texts,
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
                "llama.cpp embed error: {}",
                text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::provider)?;

        let mut embeddings = Vec::with_capacity(texts.len());
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(vals) = item["embedding"].as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }

        check_batch_len(self.name(), texts.len(), embeddings.len())?;
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Requires a llama.cpp embedding server listening locally.
    #[tokio::test]
    #[ignore]
    async fn live_llamacpp_embed() {
        let provider = LlamaCppEmbedding::new(
            "http://127.0.0.1:8090".to_string(),
            "all-MiniLM-L6-v2".to_string(),
            Duration::from_secs(60),
        )
        .unwrap();

        let texts = vec!["speed limit".to_string(), "oil change".to_string()];
        let embeddings = provider.embed(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert!(!embeddings[0].is_empty());
    }
}
