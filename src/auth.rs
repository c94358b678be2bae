use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    AppState,
    error::{AppError, AppResult},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl_minutes * 60,
        }
    }

    pub fn issue(&self, user_id: i32, username: &str) -> AppResult<String> {
        let now = crate::now_sec();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("failed to sign access token: {e}").into())
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("access token expired")
                }
                _ => AppError::Unauthorized("invalid access token"),
            })
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Raw value goes to the client, only the digest is stored.
pub struct RefreshToken {
    pub raw: String,
    pub sha256: String,
}

pub fn new_refresh_token() -> RefreshToken {
    let bytes: [u8; 32] = rand::random();
    let raw = format!("clrt_{}", hex::encode(bytes));
    let sha256 = refresh_digest(&raw);
    RefreshToken { raw, sha256 }
}

pub fn refresh_digest(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// Authenticated caller, extracted from the `Authorization` header.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized("missing authorization header"))?;

        let token =
            bearer_token(header).ok_or(AppError::Unauthorized("malformed authorization header"))?;

        let claims = state.jwt.verify(token)?;
        let id = claims.sub.parse().map_err(|_| AppError::Unauthorized("invalid access token"))?;

        Ok(CurrentUser { id, username: claims.username })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_roundtrip() {
        let jwt = JwtManager::new("test-secret", 15);
        let token = jwt.issue(42, "casey").unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "casey");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn jwt_rejects_expired() {
        // TTL far enough in the past to clear the default leeway.
        let jwt = JwtManager::new("test-secret", -120);
        let token = jwt.issue(1, "casey").unwrap();
        assert!(matches!(jwt.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn jwt_rejects_wrong_secret() {
        let token = JwtManager::new("secret-a", 15).issue(1, "casey").unwrap();
        assert!(JwtManager::new("secret-b", 15).verify(&token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
        assert!(!verify_password("hunter2!", "not-a-phc-string"));
    }

    #[test]
    fn refresh_token_digest_is_stable() {
        let token = new_refresh_token();
        assert!(token.raw.starts_with("clrt_"));
        assert_eq!(token.sha256, refresh_digest(&token.raw));
        assert_ne!(token.sha256, new_refresh_token().sha256);
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
