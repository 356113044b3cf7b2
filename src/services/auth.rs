use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::HeaderMap;

use crate::core::errors::ApiError;
use crate::repositories::{Database, TokenRepository, UserRepository};

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: TokenRepository,
    token_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(db: &Database, token_ttl_minutes: i64) -> Self {
        Self {
            users: db.users(),
            tokens: db.tokens(),
            token_ttl_minutes,
        }
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<i64, ApiError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(ApiError::BadRequest("Email already registered".to_string()));
        }

        let hashed = hash_password(password)?;
        self.users.create(email, &hashed).await
    }

    /// Verifies credentials and issues a fresh bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !verify_password(password, &user.hashed_password) {
            return Err(ApiError::Unauthorized);
        }

        self.tokens.issue(user.id, self.token_ttl_minutes).await
    }

    /// Guard for administrative endpoints: `Authorization: Bearer <token>`.
    pub async fn authorize_bearer(&self, headers: &HeaderMap) -> Result<i64, ApiError> {
        let token = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        self.tokens
            .find_valid(token)
            .await?
            .ok_or(ApiError::Unauthorized)
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {}", e)))
}

fn verify_password(password: &str, hashed: &str) -> bool {
    PasswordHash::new(hashed)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    use crate::repositories::test_database;

    #[tokio::test]
    async fn signup_login_and_bearer_guard() {
        let db = test_database().await;
        let auth = AuthService::new(&db, 30);

        let user_id = auth.signup("driver@example.com", "hunter2").await.unwrap();

        let duplicate = auth.signup("driver@example.com", "other").await;
        assert!(matches!(duplicate, Err(ApiError::BadRequest(_))));

        let token = auth.login("driver@example.com", "hunter2").await.unwrap();

        let wrong = auth.login("driver@example.com", "wrong").await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized)));

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(auth.authorize_bearer(&headers).await.unwrap(), user_id);

        let empty = HeaderMap::new();
        assert!(matches!(
            auth.authorize_bearer(&empty).await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn password_hashes_verify_and_reject() {
        let hashed = hash_password("secret").unwrap();
        assert!(verify_password("secret", &hashed));
        assert!(!verify_password("not-secret", &hashed));
        assert!(!verify_password("secret", "not-a-phc-string"));
    }
}
