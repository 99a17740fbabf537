// ============================================================================
// AUTH SERVICE
// ============================================================================
// Issues and validates HS256 session tokens and hashes passwords with bcrypt.
// ============================================================================

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::config::AuthConfig;
use shared::AppError;
use std::time::Duration;
use tracing::warn;

use crate::models::User;

pub const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT payload. `sub` carries the user id as a string.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid token subject"))
    }
}

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: config.token_ttl,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    // ========================================================================
    // TOKENS
    // ========================================================================

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now,
            exp: now + self.token_ttl.as_secs() as i64,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(JWT_ALGORITHM);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthorized("Token has expired")
                    }
                    _ => AppError::unauthorized("Invalid token"),
                }
            })
    }

    // ========================================================================
    // PASSWORDS
    // ========================================================================

    /// bcrypt is CPU bound, so hashing runs on the blocking pool.
    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {}", e)))?
            .map_err(AppError::from)
    }

    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {}", e)))?
            .map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BCRYPT_COST: u32 = 4;

    fn service(ttl_secs: u64) -> AuthService {
        AuthService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl: Duration::from_secs(ttl_secs),
            bcrypt_cost: TEST_BCRYPT_COST,
        })
    }

    fn user() -> User {
        User {
            id: 42,
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_and_carries_the_user() {
        let auth = service(3600);
        let token = auth.issue_token(&user()).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "ana@example.com");
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = service(3600).issue_token(&user()).unwrap();
        let other = AuthService::new(&AuthConfig {
            jwt_secret: "other".to_string(),
            token_ttl: Duration::from_secs(3600),
            bcrypt_cost: TEST_BCRYPT_COST,
        });
        let err = other.verify_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(service(3600).verify_token("not.a.jwt").is_err());
    }

    #[tokio::test]
    async fn password_round_trip() {
        let auth = service(3600);
        let hash = auth.hash_password("correct horse").await.unwrap();
        assert!(auth.verify_password("correct horse", &hash).await.unwrap());
        assert!(!auth.verify_password("wrong horse", &hash).await.unwrap());
    }
}
