pub mod qdrant;
pub mod sqlite;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

pub use store::{ChunkMetadata, ScoredChunk, VectorStore};

use crate::core::config::{AppPaths, Settings};
use crate::core::errors::ApiError;

use qdrant::QdrantVectorStore;
use sqlite::SqliteVectorStore;

/// Constructs the vector store named by `name`. Async because the embedded
/// variant opens its database eagerly.
pub async fn create(
    name: &str,
    settings: &Settings,
    paths: &AppPaths,
) -> Result<Arc<dyn VectorStore>, ApiError> {
    match name {
        "sqlite" => {
            let store = SqliteVectorStore::open(paths.user_data_dir.join("vectors.db")).await?;
            Ok(Arc::new(store))
        }
        "qdrant" => {
            let store = QdrantVectorStore::connect(
                &settings.qdrant_url,
                settings.qdrant_collection.clone(),
                Duration::from_secs(settings.request_timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
        other => Err(ApiError::UnknownProvider {
            capability: "vectordb",
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_paths() -> AppPaths {
        let root = std::env::temp_dir().join(format!("roadmate-paths-{}", uuid::Uuid::new_v4()));
        AppPaths {
            project_root: root.clone(),
            user_data_dir: root.clone(),
            log_dir: root.join("logs"),
            db_path: root.join("roadmate.db"),
            upload_dir: root.join("uploads"),
            model_artifact_path: root.join("price_model.json"),
        }
    }

    #[tokio::test]
    async fn factory_rejects_unknown_names() {
        let err = create("pinecone", &Settings::default(), &temp_paths())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("pinecone"));
    }
}
