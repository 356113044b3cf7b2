use async_trait::async_trait;

use crate::core::errors::ApiError;

#[async_trait]
pub trait EmbeddingProvider: std::fmt::Debug + Send + Sync {
    /// return the provider name (e.g. "gemini", "llamacpp")
    fn name(&self) -> &'static str;

    /// Embed a batch of texts.
    ///
    /// Contract: the output has exactly one vector per input text, in input
    /// order. Fails with `ApiError::Provider` when the backing service is
    /// unreachable or misconfigured.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

/// Shared contract check: a provider answering with the wrong number of
/// vectors is a provider failure, not silently truncated data.
pub(super) fn check_batch_len(
    provider: &str,
    expected: usize,
    got: usize,
) -> Result<(), ApiError> {
    if expected != got {
        return Err(ApiError::Provider(format!(
            "{} returned {} embeddings for {} inputs",
            provider, got, expected
        )));
    }
    Ok(())
}
