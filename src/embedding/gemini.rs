use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{check_batch_len, EmbeddingProvider};
use crate::core::errors::ApiError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Hosted Gemini embedding variant (`embedContent`, one call per text).
#[derive(Clone, Debug)]
pub struct GeminiEmbedding {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiEmbedding {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            API_BASE, self.model, self.api_key
        );

        let body = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
            "taskType": "RETRIEVAL_DOCUMENT",
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
                "Gemini embed error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::provider)?;
        let values = payload["embedding"]["values"]
            .as_array()
            .ok_or_else(|| ApiError::Provider("Gemini embed response missing values".to_string()))?;

        Ok(values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        check_batch_len(self.name(), texts.len(), embeddings.len())?;
        Ok(embeddings)
    }
}
