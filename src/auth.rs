//! Password hashing, token signing and the authenticated-user extractor.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::schemas::{api_error, ApiError, AppState};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    /// The status, code and body the client sees.
    pub fn into_api_error(self) -> ApiError {
        let (status, code) = match self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::Internal(ref message) => {
                error!("Authentication failure: {}", message);
                // Do not leak internals to the client
                return api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Authentication failed",
                );
            }
        };
        api_error(status, code, self.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_api_error().into_response()
    }
}

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(candidate: &str, password_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::Internal(format!("Stored password hash is invalid: {e}")))?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|err| match err {
            PasswordHashError::Password => AuthError::InvalidCredentials,
            other => AuthError::Internal(format!("Password verification failed: {other}")),
        })
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    exp: i64,
    iat: i64,
}

/// A signed token together with its lifetime in seconds.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// HS256 keys derived from the configured secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: i32) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))?;
        Ok(IssuedToken {
            token,
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<i32, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature
                | ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthError::Unauthorized,
                other => AuthError::Internal(format!("Failed to validate token: {other:?}")),
            }
        })?;
        data.claims.sub.parse().map_err(|_| AuthError::Unauthorized)
    }
}

/// The user making the request, resolved from the `Authorization: Bearer` header.
///
/// Handlers that take this extractor reject anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        trace!("Resolving authenticated user");
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                debug!("Request has no bearer token");
                AuthError::Unauthorized
            })?;

        let user_id = state.auth.verify(token).inspect_err(|e| warn!("Rejected token: {}", e))?;

        match user::Entity::find_by_id(user_id).one(&state.db).await {
            Ok(Some(user)) => Ok(AuthUser {
                id: user.id,
                username: user.username,
            }),
            Ok(None) => {
                warn!("Token refers to unknown user {}", user_id);
                Err(AuthError::Unauthorized)
            }
            Err(e) => {
                error!("Failed to load user {}: {}", user_id, e);
                Err(AuthError::Internal(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(verify_password("anything", "not-a-hash"), Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_token_carries_user_id() {
        let keys = TokenKeys::new(b"test-secret", 30);
        let issued = keys.issue(42).unwrap();

        assert_eq!(issued.expires_in, 30 * 60);
        assert_eq!(keys.verify(&issued.token).unwrap(), 42);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let keys = TokenKeys::new(b"test-secret", 30);
        let other = TokenKeys::new(b"another-secret", 30);
        let token = other.issue(1).unwrap().token;
        assert!(matches!(keys.verify(&token), Err(AuthError::Unauthorized)));

        // Well past the default validation leeway
        let expired = TokenKeys::new(b"test-secret", -10).issue(1).unwrap().token;
        assert!(matches!(keys.verify(&expired), Err(AuthError::Unauthorized)));

        assert!(matches!(keys.verify("garbage"), Err(AuthError::Unauthorized)));
    }
}
