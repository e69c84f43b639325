//! Mailbox messages for the hub actor.

use common::types::{Identity, UserId};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::protocol::{ClientFrame, ServerFrame};

/// Opaque identifier for one physical connection.
///
/// A user id can be claimed by successive connections; the session id tells
/// them apart so a stale connection's teardown cannot evict its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages processed by the hub actor, one at a time.
#[derive(Debug)]
pub enum HubMessage {
    /// Admit an authenticated connection into the registry.
    Register {
        identity: Identity,
        session_id: SessionId,
        /// Outbound channel to the connection's send task.
        sender: mpsc::Sender<ServerFrame>,
        /// Resolved once registration side effects (presence, broadcast)
        /// are complete.
        respond_to: oneshot::Sender<()>,
    },

    /// Remove a connection from the registry.
    ///
    /// Ignored when `session_id` no longer matches the registered entry
    /// for `user_id` (the connection was already replaced).
    Deregister {
        user_id: UserId,
        session_id: SessionId,
    },

    /// A parsed frame received from a registered connection.
    Inbound { from: Identity, frame: ClientFrame },

    /// Registry counters for observability.
    GetStatus {
        respond_to: oneshot::Sender<HubStatus>,
    },
}

/// Point-in-time counters reported by the hub actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStatus {
    /// Live registered sessions.
    pub sessions: usize,
    /// Inbound frames processed since start.
    pub messages_processed: u64,
}
