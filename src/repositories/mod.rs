//! SQLite persistence. One `Database` handle owns the pool and the schema;
//! repositories are thin per-aggregate views over it.

pub mod conversations;
pub mod messages;
pub mod pdfs;
pub mod predictions;
pub mod tokens;
pub mod users;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::core::errors::ApiError;

pub use conversations::{ConversationRecord, ConversationRepository};
pub use messages::{MessageRecord, MessageRepository};
pub use pdfs::{PdfRecord, PdfRepository};
pub use predictions::{PredictionRecord, PredictionRepository};
pub use tokens::TokenRepository;
pub use users::{UserRecord, UserRepository};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_path: &Path) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| ApiError::internal(format!("failed to open database: {}", e)))?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS pdfs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pdf_id TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                content BLOB NOT NULL,
                conversation_id TEXT NOT NULL DEFAULT '',
                uploaded_at TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_pdfs_conversation ON pdfs(conversation_id)",
            "CREATE TABLE IF NOT EXISTS conversations (
                conversation_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id)",
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS auth_tokens (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                input TEXT NOT NULL,
                predicted_price REAL NOT NULL,
                created_at TEXT NOT NULL
            )",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| ApiError::internal(format!("failed to init schema: {}", e)))?;
        }

        Ok(())
    }

    pub fn pdfs(&self) -> PdfRepository {
        PdfRepository::new(self.pool.clone())
    }

    pub fn conversations(&self) -> ConversationRepository {
        ConversationRepository::new(self.pool.clone())
    }

    pub fn messages(&self) -> MessageRepository {
        MessageRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn tokens(&self) -> TokenRepository {
        TokenRepository::new(self.pool.clone())
    }

    pub fn predictions(&self) -> PredictionRepository {
        PredictionRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    let tmp = std::env::temp_dir().join(format!("roadmate-db-test-{}.db", uuid::Uuid::new_v4()));
    Database::connect(&tmp).await.unwrap()
}
