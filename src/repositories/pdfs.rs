use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;

/// PDF metadata as stored. `conversation_id == ""` marks a global document
/// visible across conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfRecord {
    pub pdf_id: String,
    pub filename: String,
    pub conversation_id: String,
    pub uploaded_at: String,
}

#[derive(Clone)]
pub struct PdfRepository {
    pool: SqlitePool,
}

impl PdfRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        pdf_id: &str,
        filename: &str,
        content: &[u8],
        conversation_id: &str,
    ) -> Result<i64, ApiError> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO pdfs (pdf_id, filename, content, conversation_id, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(pdf_id)
        .bind(filename)
        .bind(content)
        .bind(conversation_id)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, pdf_id: &str) -> Result<Option<PdfRecord>, ApiError> {
        let row = sqlx::query(
            "SELECT pdf_id, filename, conversation_id, uploaded_at FROM pdfs WHERE pdf_id = ?1",
        )
        .bind(pdf_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(row_to_record))
    }

    /// Raw bytes of the uploaded file.
    pub async fn content(&self, pdf_id: &str) -> Result<Option<Vec<u8>>, ApiError> {
        let row = sqlx::query("SELECT content FROM pdfs WHERE pdf_id = ?1")
            .bind(pdf_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(row.map(|r| r.get("content")))
    }

    pub async fn find_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<PdfRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT pdf_id, filename, conversation_id, uploaded_at
             FROM pdfs WHERE conversation_id = ?1 ORDER BY uploaded_at DESC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    pub async fn find_global(&self) -> Result<Vec<PdfRecord>, ApiError> {
        self.find_by_conversation("").await
    }

    pub async fn delete(&self, pdf_id: &str) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM pdfs WHERE pdf_id = ?1")
            .bind(pdf_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected() as usize)
    }

    pub async fn delete_by_conversation(&self, conversation_id: &str) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM pdfs WHERE conversation_id = ?1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected() as usize)
    }

    pub async fn count_all(&self) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pdfs")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    pub async fn count_global(&self) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pdfs WHERE conversation_id = ''")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> PdfRecord {
    PdfRecord {
        pdf_id: row.get("pdf_id"),
        filename: row.get("filename"),
        conversation_id: row.get("conversation_id"),
        uploaded_at: row.get("uploaded_at"),
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::test_database;

    #[tokio::test]
    async fn global_and_conversation_pdfs_are_disjoint() {
        let db = test_database().await;
        let repo = db.pdfs();

        repo.create("pdf_a", "laws.pdf", b"%PDF", "").await.unwrap();
        repo.create("pdf_b", "notes.pdf", b"%PDF", "conv_1")
            .await
            .unwrap();

        let global = repo.find_global().await.unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].pdf_id, "pdf_a");

        let scoped = repo.find_by_conversation("conv_1").await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].pdf_id, "pdf_b");

        assert!(repo
            .find_by_conversation("conv_other")
            .await
            .unwrap()
            .is_empty());

        assert_eq!(repo.count_all().await.unwrap(), 2);
        assert_eq!(repo.count_global().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stores_and_returns_raw_bytes() {
        let db = test_database().await;
        let repo = db.pdfs();

        repo.create("pdf_a", "laws.pdf", b"%PDF-1.4 payload", "")
            .await
            .unwrap();

        let bytes = repo.content("pdf_a").await.unwrap().unwrap();
        assert_eq!(bytes, b"%PDF-1.4 payload");
        assert!(repo.content("pdf_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_by_conversation_leaves_globals() {
        let db = test_database().await;
        let repo = db.pdfs();

        repo.create("pdf_a", "laws.pdf", b"x", "").await.unwrap();
        repo.create("pdf_b", "notes.pdf", b"x", "conv_1").await.unwrap();
        repo.create("pdf_c", "more.pdf", b"x", "conv_1").await.unwrap();

        assert_eq!(repo.delete_by_conversation("conv_1").await.unwrap(), 2);
        assert_eq!(repo.count_all().await.unwrap(), 1);
        assert_eq!(repo.delete("pdf_a").await.unwrap(), 1);
        assert_eq!(repo.count_all().await.unwrap(), 0);
    }
}
