//! Qdrant-backed vector store.
//!
//! Hosted variant: chunks live in a Qdrant collection, one point per chunk.
//! Qdrant point ids must be UUIDs, so the chunk id (`{pdf_id}_chunk_{i}`) is
//! mapped to a deterministic UUIDv5 and kept verbatim in the payload — the
//! same chunk id always lands on the same point, preserving upsert semantics.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use uuid::Uuid;

use super::store::{check_equal_lengths, ChunkMetadata, ScoredChunk, VectorStore};
use crate::core::errors::ApiError;

pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
}

impl std::fmt::Debug for QdrantVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantVectorStore")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl QdrantVectorStore {
    pub fn connect(url: &str, collection: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Qdrant::from_url(url)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Configuration(format!("qdrant client: {}", e)))?;

        Ok(Self { client, collection })
    }

    fn point_id(chunk_id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), ApiError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(ApiError::provider)?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
                        VectorParamsBuilder::new(dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(ApiError::provider)?;
        }

        Ok(())
    }
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> String {
    match payload.get(key) {
        Some(Value {
            kind: Some(Kind::StringValue(s)),
        }) => s.clone(),
        _ => String::new(),
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    async fn add_documents(
        &self,
        texts: &[String],
        embeddings: &[Vec<f32>],
        metadata: &[ChunkMetadata],
        ids: &[String],
    ) -> Result<(), ApiError> {
        check_equal_lengths(texts.len(), embeddings.len(), metadata.len(), ids.len())?;
        if texts.is_empty() {
            return Ok(());
        }

        self.ensure_collection(embeddings[0].len()).await?;

        let points: Vec<PointStruct> = (0..texts.len())
            .map(|i| {
                let mut payload: HashMap<String, Value> = HashMap::new();
                payload.insert("text".to_string(), Value::from(texts[i].clone()));
                payload.insert("chunk_id".to_string(), Value::from(ids[i].clone()));
                payload.insert("source".to_string(), Value::from(metadata[i].source.clone()));
                payload.insert("pdf_id".to_string(), Value::from(metadata[i].pdf_id.clone()));
                payload.insert(
                    "conversation_id".to_string(),
                    Value::from(metadata[i].conversation_id.clone()),
                );

                PointStruct::new(Self::point_id(&ids[i]), embeddings[i].clone(), payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
            .await
            .map_err(ApiError::provider)?;

        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, ApiError> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    self.collection.clone(),
                    query_embedding.to_vec(),
                    top_k as u64,
                )
                .with_payload(true),
            )
            .await
            .map_err(ApiError::provider)?;

        let results = response
            .result
            .into_iter()
            .map(|point| ScoredChunk {
                text: payload_str(&point.payload, "text"),
                metadata: ChunkMetadata {
                    source: payload_str(&point.payload, "source"),
                    pdf_id: payload_str(&point.payload, "pdf_id"),
                    conversation_id: payload_str(&point.payload, "conversation_id"),
                },
                score: point.score,
            })
            .collect();

        Ok(results)
    }

    async fn delete_by_pdf(&self, pdf_id: &str) -> Result<usize, ApiError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(self.collection.clone())
                    .points(Filter::must([Condition::matches(
                        "pdf_id",
                        pdf_id.to_string(),
                    )]))
                    .wait(true),
            )
            .await
            .map_err(ApiError::provider)?;

        // Qdrant does not report how many points a filter delete removed.
        Ok(0)
    }

    async fn delete_by_conversation(&self, conversation_id: &str) -> Result<usize, ApiError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(self.collection.clone())
                    .points(Filter::must([Condition::matches(
                        "conversation_id",
                        conversation_id.to_string(),
                    )]))
                    .wait(true),
            )
            .await
            .map_err(ApiError::provider)?;

        Ok(0)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(self.collection.clone()).exact(true))
            .await
            .map_err(ApiError::provider)?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn count_by_pdf(&self, pdf_id: &str) -> Result<usize, ApiError> {
        let response = self
            .client
            .count(
                CountPointsBuilder::new(self.collection.clone())
                    .filter(Filter::must([Condition::matches(
                        "pdf_id",
                        pdf_id.to_string(),
                    )]))
                    .exact(true),
            )
            .await
            .map_err(ApiError::provider)?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_deterministic_and_distinct() {
        let a1 = QdrantVectorStore::point_id("pdf_1_chunk_0");
        let a2 = QdrantVectorStore::point_id("pdf_1_chunk_0");
        let b = QdrantVectorStore::point_id("pdf_1_chunk_1");

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(Uuid::parse_str(&a1).is_ok());
    }

    // Requires a Qdrant server listening locally.
    #[tokio::test]
    #[ignore]
    async fn live_qdrant_roundtrip() {
        let store = QdrantVectorStore::connect(
            "http://127.0.0.1:6334",
            format!("roadmate_test_{}", Uuid::new_v4().simple()),
            Duration::from_secs(10),
        )
        .unwrap();

        let meta = ChunkMetadata {
            source: "manual.pdf".to_string(),
            pdf_id: "pdf_x".to_string(),
            conversation_id: "".to_string(),
        };

        store
            .add_documents(
                &["stopping distance".to_string()],
                &[vec![1.0, 0.0, 0.0]],
                &[meta],
                &["pdf_x_chunk_0".to_string()],
            )
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.pdf_id, "pdf_x");

        store.delete_by_pdf("pdf_x").await.unwrap();
    }
}
