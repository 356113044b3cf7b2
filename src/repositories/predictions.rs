use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub input: Value,
    pub predicted_price: f64,
    pub created_at: String,
}

#[derive(Clone)]
pub struct PredictionRepository {
    pool: SqlitePool,
}

impl PredictionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &Value, predicted_price: f64) -> Result<i64, ApiError> {
        let now = chrono::Utc::now().to_rfc3339();
        let input_str = serde_json::to_string(input).map_err(ApiError::internal)?;

        let result = sqlx::query(
            "INSERT INTO predictions (input, predicted_price, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(&input_str)
        .bind(predicted_price)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_all(&self) -> Result<Vec<PredictionRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, input, predicted_price, created_at FROM predictions ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| {
                let input_str: String = row.get("input");
                PredictionRecord {
                    id: row.get("id"),
                    input: serde_json::from_str(&input_str).unwrap_or(Value::Null),
                    predicted_price: row.get("predicted_price"),
                    created_at: row.get("created_at"),
                }
            })
            .collect())
    }
}
