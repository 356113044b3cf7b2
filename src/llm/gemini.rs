use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{text_or_fallback, LlmProvider};
use crate::core::errors::ApiError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Answer strictly based on the \
provided Context. Do not repeat the prompt or the instructions. If the Context is insufficient, \
reply exactly: \"I'm not sure based on the context.\" Respond in one concise paragraph.";

/// Hosted Gemini API variant.
#[derive(Clone, Debug)]
pub struct GeminiLlm {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiLlm {
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
}

#[async_trait]
impl LlmProvider for GeminiLlm {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );

        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.2,
                "topP": 0.9,
                "topK": 40,
            },
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
                "Gemini generate error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::provider)?;
        Ok(extract_answer(&payload))
    }
}

/// Pulls the first candidate's text out of a `generateContent` response.
/// A blocked, truncated or empty candidate yields the fallback sentence.
fn extract_answer(payload: &Value) -> String {
    let text = payload["candidates"][0]["content"]["parts"][0]["text"].as_str();
    text_or_fallback(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::FALLBACK_ANSWER;

    #[test]
    fn extracts_candidate_text() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  Keep right.  " }] }
            }]
        });
        assert_eq!(extract_answer(&payload), "Keep right.");
    }

    #[test]
    fn blocked_or_empty_candidate_falls_back() {
        let blocked = json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        });
        assert_eq!(extract_answer(&blocked), FALLBACK_ANSWER);

        let empty = json!({ "candidates": [] });
        assert_eq!(extract_answer(&empty), FALLBACK_ANSWER);
    }
}
