//! Credential token verification for hub connections.
//!
//! The hub admits a WebSocket connection only after verifying the opaque
//! token supplied on the upgrade path. Tokens are HMAC-SHA256 JWTs carrying
//! the user's identity (`{id, email, role}`) issued by the external Auth
//! Service; the hub only verifies, it never issues.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (resource-exhaustion guard)
//! - Only HS256 is accepted
//! - Error messages are generic to prevent information leakage; detail is
//!   logged at debug level
//! - The `email` claim is redacted in Debug output

use crate::secret::{ExposeSecret, SecretString};
use crate::types::{Identity, Role, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum allowed token size in bytes (8KB).
///
/// Typical tokens are a few hundred bytes; anything larger is rejected
/// before base64 decode or signature verification runs.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Errors that can occur during token verification.
///
/// Messages are intentionally generic; the distinguishing detail is only
/// logged server-side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token was supplied on the upgrade path.
    #[error("The access token is invalid or expired")]
    MissingToken,

    /// Token size exceeds [`MAX_TOKEN_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Signature, structure, or claim validation failed.
    #[error("The access token is invalid or expired")]
    InvalidToken,
}

/// Claims carried by a connection credential token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id assigned by the directory.
    pub id: UserId,

    /// User email - redacted in Debug output.
    pub email: String,

    /// Role fixed at registration time.
    pub role: Role,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("id", &self.id)
            .field("email", &"[REDACTED]")
            .field("role", &self.role)
            .field("exp", &self.exp)
            .finish()
    }
}

impl Claims {
    /// The connection-scoped identity these claims authenticate.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            role: self.role,
        }
    }
}

/// Verify a credential token and return its claims.
///
/// # Errors
///
/// - [`AuthError::TokenTooLarge`] - token exceeds the size limit
/// - [`AuthError::InvalidToken`] - bad signature, malformed structure,
///   wrong algorithm, missing claims, or expired
pub fn verify(token: &str, secret: &SecretString) -> Result<Claims, AuthError> {
    // Size check first, before any decoding work
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "hub.auth",
            token_len = token.len(),
            "Rejected oversized token"
        );
        return Err(AuthError::TokenTooLarge);
    }

    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let data = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(target: "hub.auth", error = %e, "Token verification failed");
        AuthError::InvalidToken
    })?;

    Ok(data.claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    const TEST_SECRET: &str = "test-secret-value";

    fn sign(claims: &Claims, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("signing should succeed")
    }

    fn valid_claims() -> Claims {
        Claims {
            id: UserId(12),
            email: "pat@example.com".to_string(),
            role: Role::Patient,
            exp: chrono::Utc::now().timestamp() + 3600,
        }
    }

    #[test]
    fn test_verify_valid_token() {
        let token = sign(&valid_claims(), TEST_SECRET);
        let claims = verify(&token, &SecretString::from(TEST_SECRET)).unwrap();

        assert_eq!(claims.id, UserId(12));
        assert_eq!(claims.role, Role::Patient);
        assert_eq!(claims.identity().id, UserId(12));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = sign(&valid_claims(), TEST_SECRET);
        let result = verify(&token, &SecretString::from("some-other-secret"));
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_verify_expired_token() {
        let mut claims = valid_claims();
        claims.exp = chrono::Utc::now().timestamp() - 3600;
        let token = sign(&claims, TEST_SECRET);

        let result = verify(&token, &SecretString::from(TEST_SECRET));
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_verify_garbage_token() {
        let result = verify("not-a-jwt", &SecretString::from(TEST_SECRET));
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_verify_oversized_token() {
        let huge = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        let result = verify(&huge, &SecretString::from(TEST_SECRET));
        assert_eq!(result, Err(AuthError::TokenTooLarge));
    }

    #[test]
    fn test_error_messages_are_generic() {
        assert_eq!(
            AuthError::TokenTooLarge.to_string(),
            AuthError::InvalidToken.to_string()
        );
    }

    #[test]
    fn test_claims_debug_redacts_email() {
        let claims = valid_claims();
        let debug = format!("{claims:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("pat@example.com"));
    }
}
