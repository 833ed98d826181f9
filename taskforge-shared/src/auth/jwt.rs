/// JWT access-token validation
///
/// Token *issuance* lives in the identity service; this module only needs
/// to mint tokens for tests/tooling and to validate what callers present.
/// Tokens are signed with HS256 and carry the caller's id and role — the
/// two facts the access scope enforcer runs on.
///
/// # Example
///
/// ```
/// use taskforge_shared::auth::jwt::{create_access_token, validate_access_token, Claims};
/// use taskforge_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let claims = Claims::new(Uuid::new_v4(), UserRole::User);
/// let token = create_access_token(&claims, secret)?;
///
/// let validated = validate_access_token(&token, secret)?;
/// assert_eq!(validated.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Token issuer claim value
pub const ISSUER: &str = "taskforge";

/// Access token lifetime
const ACCESS_TOKEN_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}, got {actual}")]
    InvalidIssuer { expected: String, actual: String },

    /// Anything else the decoder rejects
    #[error("Failed to validate token: {0}")]
    ValidationError(String),
}

/// JWT claims
///
/// - `sub`: caller's user id
/// - `role`: caller's role, baked in at issue time (role is business data,
///   not session state, so a token outlives a demotion at most 24 hours)
/// - `iss` / `iat` / `exp`: standard claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Creates claims with the default 24h expiration.
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ACCESS_TOKEN_HOURS)).timestamp(),
        }
    }

    /// Creates already-expired claims; test helper for rejection paths.
    pub fn expired(user_id: Uuid, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        }
    }
}

/// Signs an access token with HS256.
pub fn create_access_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Validates signature, expiry, and issuer; returns the claims.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
            actual: "unknown".to_string(),
        },
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_round_trip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Admin);
        let token = create_access_token(&claims, SECRET).unwrap();

        let validated = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.role, UserRole::Admin);
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::expired(Uuid::new_v4(), UserRole::User);
        let token = create_access_token(&claims, SECRET).unwrap();

        match validate_access_token(&token, SECRET) {
            Err(JwtError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::User);
        let token = create_access_token(&claims, SECRET).unwrap();

        assert!(validate_access_token(&token, "another-secret-that-is-long-enough").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::User);
        let mut token = create_access_token(&claims, SECRET).unwrap();
        token.push('x');

        assert!(validate_access_token(&token, SECRET).is_err());
    }
}
