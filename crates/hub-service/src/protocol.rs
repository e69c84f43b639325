//! Wire frame model for the hub's WebSocket protocol.
//!
//! Frames are JSON text with an internally tagged `type` field. The inbound
//! set is closed: every type the hub dispatches on is a variant of
//! [`ClientFrame`], and anything else parses into [`ClientFrame::Unknown`]
//! instead of falling through untyped.
//!
//! Frames are ephemeral routing envelopes; nothing here is ever persisted.
//! The `payload` field is opaque to the hub and relayed verbatim.

use common::types::{PublicUser, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound frame from a connected client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Keepalive. No action.
    Heartbeat,

    /// Direct chat message for `to`.
    Chat {
        #[serde(default)]
        to: Option<UserId>,
        #[serde(default)]
        payload: Value,
    },

    /// WebRTC offer, relayed verbatim.
    Offer {
        #[serde(default)]
        to: Option<UserId>,
        #[serde(default)]
        payload: Value,
    },

    /// WebRTC answer, relayed verbatim.
    Answer {
        #[serde(default)]
        to: Option<UserId>,
        #[serde(default)]
        payload: Value,
    },

    /// ICE candidate, relayed verbatim.
    IceCandidate {
        #[serde(default)]
        to: Option<UserId>,
        #[serde(default)]
        payload: Value,
    },

    /// Request to start a call with doctor `to`.
    CallStart {
        #[serde(default)]
        to: Option<UserId>,
        #[serde(default)]
        payload: Value,
    },

    /// End a call with peer `to`.
    CallEnd {
        #[serde(default)]
        to: Option<UserId>,
        #[serde(default)]
        payload: Value,
    },

    /// Any `type` string outside the dispatch table.
    #[serde(other)]
    Unknown,
}

impl ClientFrame {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error for non-parseable input (including
    /// a missing `type` field); such frames are dropped without response.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Outbound frame pushed to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// Full presence snapshot, sent to every registered session.
    Users { payload: Vec<PublicUser> },

    /// Acknowledgment for a `call-start` request, sent to the caller only.
    CallResponse { payload: CallOutcome },

    /// Relayed chat message.
    Chat { from: UserId, payload: Value },

    /// Relayed WebRTC offer.
    Offer { from: UserId, payload: Value },

    /// Relayed WebRTC answer.
    Answer { from: UserId, payload: Value },

    /// Relayed ICE candidate.
    IceCandidate { from: UserId, payload: Value },

    /// Incoming-call notification delivered to the target doctor.
    CallStart { from: UserId, payload: Value },

    /// Call-end notification delivered to the peer.
    CallEnd { from: UserId, payload: Value },
}

impl ServerFrame {
    /// Successful call acknowledgment.
    #[must_use]
    pub fn call_ok() -> Self {
        ServerFrame::CallResponse {
            payload: CallOutcome {
                ok: true,
                reason: None,
            },
        }
    }

    /// Rejected call acknowledgment with a reason.
    #[must_use]
    pub fn call_rejected(reason: CallRejectReason) -> Self {
        ServerFrame::CallResponse {
            payload: CallOutcome {
                ok: false,
                reason: Some(reason),
            },
        }
    }
}

/// Payload of a `call-response` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<CallRejectReason>,
}

/// Why a `call-start` request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallRejectReason {
    /// The `to` id does not resolve to any user.
    DoctorNotFound,
    /// The `to` id resolves to a non-doctor.
    NotADoctor,
    /// The doctor exists but is not ONLINE.
    DoctorNotAvailable,
}
