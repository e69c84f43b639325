//! Connection authentication.
//!
//! A connection proves identity exactly once, with a `?token=` query
//! parameter on the upgrade request. There is no re-authentication and no
//! per-frame credential; everything a session does afterwards is attributed
//! to the identity established here.

use common::jwt::{self, AuthError};
use common::secret::SecretString;
use common::types::Identity;

use crate::errors::HubError;

/// Authenticate an upgrade request from its optional `token` parameter.
///
/// All failures (absent, oversized, malformed, bad signature, expired)
/// collapse into [`HubError::Unauthorized`]; callers reject with a generic
/// 401 and no distinguishing detail.
///
/// # Errors
///
/// Returns [`HubError::Unauthorized`] when no valid identity can be
/// established.
pub fn authenticate(token: Option<&str>, secret: &SecretString) -> Result<Identity, HubError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let claims = jwt::verify(token, secret)?;
    Ok(claims.identity())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::types::{Role, UserId};
    use hub_test_utils::{expired_token_for, token_for, TEST_JWT_SECRET};

    fn secret() -> SecretString {
        SecretString::from(TEST_JWT_SECRET)
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let token = token_for(UserId(42), Role::Doctor, TEST_JWT_SECRET);
        let identity = authenticate(Some(&token), &secret()).unwrap();

        assert_eq!(identity.id, UserId(42));
        assert_eq!(identity.role, Role::Doctor);
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let result = authenticate(None, &secret());
        assert!(matches!(result, Err(HubError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let token = expired_token_for(UserId(42), Role::Doctor, TEST_JWT_SECRET);
        let result = authenticate(Some(&token), &secret());
        assert!(matches!(result, Err(HubError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = token_for(UserId(42), Role::Doctor, "some-other-secret");
        let result = authenticate(Some(&token), &secret());
        assert!(matches!(result, Err(HubError::Unauthorized(_))));
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let result = authenticate(Some("not.a.jwt"), &secret());
        assert!(matches!(result, Err(HubError::Unauthorized(_))));
    }
}
