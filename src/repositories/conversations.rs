use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, conversation_id: &str, title: &str) -> Result<(), ApiError> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO conversations (conversation_id, title, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(conversation_id)
        .bind(title)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn find_by_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationRecord>, ApiError> {
        let row = sqlx::query(
            "SELECT conversation_id, title, created_at FROM conversations
             WHERE conversation_id = ?1",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(row_to_record))
    }

    /// All conversations, newest first.
    pub async fn find_all(&self) -> Result<Vec<ConversationRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT conversation_id, title, created_at FROM conversations
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    pub async fn delete(&self, conversation_id: &str) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM conversations WHERE conversation_id = ?1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected() as usize)
    }

    pub async fn count_all(&self) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ConversationRecord {
    ConversationRecord {
        conversation_id: row.get("conversation_id"),
        title: row.get("title"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::test_database;

    #[tokio::test]
    async fn create_find_delete_roundtrip() {
        let db = test_database().await;
        let repo = db.conversations();

        repo.create("conv_1", "Highway rules").await.unwrap();
        let found = repo.find_by_id("conv_1").await.unwrap().unwrap();
        assert_eq!(found.title, "Highway rules");

        assert!(repo.find_by_id("conv_missing").await.unwrap().is_none());

        assert_eq!(repo.count_all().await.unwrap(), 1);
        assert_eq!(repo.delete("conv_1").await.unwrap(), 1);
        assert_eq!(repo.count_all().await.unwrap(), 0);
    }
}
