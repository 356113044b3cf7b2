//! VectorStore trait — abstract interface over vector database backends.
//!
//! The embedded implementation is `SqliteVectorStore`; `QdrantVectorStore`
//! talks to a hosted Qdrant server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Metadata attached to every stored chunk. The field values are part of the
/// on-disk contract: `conversation_id` is `""` for global documents, and
/// scope filtering matches on it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source filename the chunk was extracted from.
    pub source: String,
    /// Owning PDF id (`pdf_<token>`).
    pub pdf_id: String,
    /// Owning conversation id, or `""` for a global document.
    pub conversation_id: String,
}

/// One similarity-search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Similarity score (higher = closer).
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: std::fmt::Debug + Send + Sync {
    /// return the provider name (e.g. "sqlite", "qdrant")
    fn name(&self) -> &'static str;

    /// Upsert a batch of chunks. All four slices must have equal length;
    /// ids may already exist (re-upload replaces the stored chunk).
    async fn add_documents(
        &self,
        texts: &[String],
        embeddings: &[Vec<f32>],
        metadata: &[ChunkMetadata],
        ids: &[String],
    ) -> Result<(), ApiError>;

    /// Top-k nearest neighbors, ordered closest first. Returns fewer than
    /// `top_k` results when the store holds fewer documents.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, ApiError>;

    /// Delete every chunk belonging to a PDF. Returns the number removed
    /// where the backend reports it.
    async fn delete_by_pdf(&self, pdf_id: &str) -> Result<usize, ApiError>;

    /// Delete every chunk belonging to a conversation.
    async fn delete_by_conversation(&self, conversation_id: &str) -> Result<usize, ApiError>;

    /// Total stored chunk count.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Chunks indexed for one PDF. Zero for a PDF that has a stored record
    /// means its ingestion never reached the vector store (orphaned upload).
    async fn count_by_pdf(&self, pdf_id: &str) -> Result<usize, ApiError>;
}

/// Length-contract check shared by the implementations.
pub(super) fn check_equal_lengths(
    texts: usize,
    embeddings: usize,
    metadata: usize,
    ids: usize,
) -> Result<(), ApiError> {
    if texts != embeddings || texts != metadata || texts != ids {
        return Err(ApiError::BadRequest(format!(
            "add_documents length mismatch: {} texts, {} embeddings, {} metadata, {} ids",
            texts, embeddings, metadata, ids
        )));
    }
    Ok(())
}
