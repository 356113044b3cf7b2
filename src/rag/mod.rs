pub mod service;

use std::sync::Arc;

pub use service::{BatchUploadResult, ChatOutcome, RagService, Statistics};

use crate::core::config::{AppPaths, ProviderSelection, Settings};
use crate::core::errors::ApiError;
use crate::repositories::Database;

/// Builds a `RagService` bound to the given provider triple. Fails fast on
/// unknown provider names or missing credentials.
pub async fn build(
    selection: &ProviderSelection,
    settings: &Settings,
    paths: &AppPaths,
    db: &Database,
) -> Result<Arc<RagService>, ApiError> {
    let llm = crate::llm::create(&selection.llm_provider, settings)?;
    let embedding = crate::embedding::create(&selection.embedding_provider, settings)?;
    let vectordb = crate::vectordb::create(&selection.vectordb_provider, settings, paths).await?;

    tracing::info!(
        "RAG providers: llm={}, embedding={}, vectordb={}",
        llm.name(),
        embedding.name(),
        vectordb.name()
    );

    Ok(Arc::new(RagService::new(
        llm, embedding, vectordb, db, settings,
    )))
}
