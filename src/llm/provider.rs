use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Answer returned when the model produced nothing usable (empty, refused or
/// truncated output). Deliberate user-facing degradation, not an error.
pub const FALLBACK_ANSWER: &str = "I'm not sure based on the context.";

#[async_trait]
pub trait LlmProvider: std::fmt::Debug + Send + Sync {
    /// return the provider name (e.g. "gemini", "llamacpp", "ngrok")
    fn name(&self) -> &'static str;

    /// Single-prompt completion.
    ///
    /// Returns `FALLBACK_ANSWER` for ambiguous/empty model output; fails with
    /// `ApiError::Provider` only when the backing service is unreachable or
    /// rejects the request.
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}

/// Normalizes raw model output: trimmed text, or the fallback sentence when
/// the model came back empty.
pub(super) fn text_or_fallback(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => FALLBACK_ANSWER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_missing_output_becomes_fallback() {
        assert_eq!(text_or_fallback(None), FALLBACK_ANSWER);
        assert_eq!(text_or_fallback(Some("")), FALLBACK_ANSWER);
        assert_eq!(text_or_fallback(Some("   \n")), FALLBACK_ANSWER);
        assert_eq!(text_or_fallback(Some("  an answer ")), "an answer");
    }
}
