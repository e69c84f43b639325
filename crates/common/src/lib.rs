//! Common utilities and types shared across Telemed Hub components.
//!
//! - [`types`] - User identifiers, roles, and presence status
//! - [`jwt`] - Credential token verification for connection admission
//! - [`secret`] - Secret wrappers that redact on Debug and zeroize on drop

pub mod jwt;
pub mod secret;
pub mod types;
