//! Hub error taxonomy.
//!
//! No error here is fatal to the hub process. `Unauthorized` rejects an
//! upgrade before a session exists; the frame-level variants are dropped at
//! the point they occur and logged, never surfaced to the sender (the one
//! exception, `call-start`, always answers with an explicit
//! `call-response` frame rather than an error).

use common::jwt::AuthError;
use thiserror::Error;

/// Presence & Signaling Hub error type.
#[derive(Debug, Error)]
pub enum HubError {
    /// Credential rejected at the upgrade handshake; no session allocated.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Inbound frame could not be parsed. Dropped, connection stays open.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// A route had no usable destination (missing `to`). Dropped silently.
    #[error("Routing miss: {0}")]
    RoutingMiss(&'static str),

    /// Frame type not in the dispatch table. Logged and dropped.
    #[error("Unknown frame type")]
    UnknownType,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (actor mailbox failures and the like).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Whether this error should end the connection it occurred on.
    ///
    /// Only internal faults (the hub actor is gone) are fatal; per-frame
    /// errors leave the connection open per the error handling contract.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, HubError::Internal(_))
    }
}
