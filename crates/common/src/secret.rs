//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. Use these for every sensitive
//! value the hub touches: the JWT signing secret, credential tokens held in
//! memory, and directory password hashes.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` over one gets safe logging for free, and the inner value
//! is zeroized on drop. Access requires an explicit `expose_secret()` call,
//! which keeps every read of a secret greppable.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("jwt-signing-secret");
        assert_eq!(secret.expose_secret(), "jwt-signing-secret");
    }

    #[test]
    fn test_struct_with_secret_is_safe() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct HubCredentials {
            hub_id: String,
            jwt_secret: SecretString,
        }

        let creds = HubCredentials {
            hub_id: "hub-1".to_string(),
            jwt_secret: SecretString::from("super-secret"),
        };

        let debug_str = format!("{creds:?}");
        assert!(debug_str.contains("hub-1"));
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super-secret"));
    }
}
