//! Builders for connection credential tokens.
//!
//! The hub only verifies tokens; in production they come from the external
//! Auth Service. Tests mint their own with these helpers.

use chrono::{Duration, Utc};
use common::jwt::Claims;
use common::types::{Role, UserId};
use jsonwebtoken::{Algorithm, EncodingKey, Header};

/// Default signing secret shared by hub tests.
pub const TEST_JWT_SECRET: &str = "hub-test-secret";

/// Mint a token for `id` with the given role, valid for one hour.
pub fn token_for(id: UserId, role: Role, secret: &str) -> String {
    sign_claims(&claims_for(id, role, 3600), secret)
}

/// Mint a token that expired an hour ago.
pub fn expired_token_for(id: UserId, role: Role, secret: &str) -> String {
    sign_claims(&claims_for(id, role, -3600), secret)
}

/// Claims for `id` expiring `expires_in` seconds from now.
pub fn claims_for(id: UserId, role: Role, expires_in: i64) -> Claims {
    Claims {
        id,
        email: format!("user{}@example.com", id.0),
        role,
        exp: (Utc::now() + Duration::seconds(expires_in)).timestamp(),
    }
}

/// Sign claims with an HS256 secret.
pub fn sign_claims(claims: &Claims, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("test token signing should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::secret::SecretString;

    #[test]
    fn test_token_verifies_with_matching_secret() {
        let token = token_for(UserId(5), Role::Doctor, TEST_JWT_SECRET);
        let claims =
            common::jwt::verify(&token, &SecretString::from(TEST_JWT_SECRET)).expect("valid");

        assert_eq!(claims.id, UserId(5));
        assert_eq!(claims.role, Role::Doctor);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = expired_token_for(UserId(5), Role::Doctor, TEST_JWT_SECRET);
        let result = common::jwt::verify(&token, &SecretString::from(TEST_JWT_SECRET));
        assert!(result.is_err());
    }
}
