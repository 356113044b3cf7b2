use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::core::errors::ApiError;

/// Opaque bearer tokens with a TTL. A token is a pair of random UUIDs, so
/// possession of the string is the whole credential.
#[derive(Clone)]
pub struct TokenRepository {
    pool: SqlitePool,
}

impl TokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn issue(&self, user_id: i64, ttl_minutes: i64) -> Result<String, ApiError> {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let expires_at = (Utc::now() + Duration::minutes(ttl_minutes)).to_rfc3339();

        sqlx::query("INSERT INTO auth_tokens (token, user_id, expires_at) VALUES (?1, ?2, ?3)")
            .bind(&token)
            .bind(user_id)
            .bind(&expires_at)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(token)
    }

    /// The owning user id, if the token exists and has not expired.
    pub async fn find_valid(&self, token: &str) -> Result<Option<i64>, ApiError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM auth_tokens WHERE token = ?1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: String = row.get("expires_at");
        let expired = chrono::DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t < Utc::now())
            .unwrap_or(true);

        if expired {
            return Ok(None);
        }

        Ok(Some(row.get("user_id")))
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::test_database;

    #[tokio::test]
    async fn issued_tokens_round_trip_until_expiry() {
        let db = test_database().await;
        let repo = db.tokens();

        let token = repo.issue(7, 30).await.unwrap();
        assert_eq!(repo.find_valid(&token).await.unwrap(), Some(7));
        assert_eq!(repo.find_valid("bogus").await.unwrap(), None);

        let expired = repo.issue(7, -1).await.unwrap();
        assert_eq!(repo.find_valid(&expired).await.unwrap(), None);
    }
}
