//! Telemed Hub Service Library
//!
//! The Presence & Signaling Hub for a telemedicine backend: a persistent
//! WebSocket server that tracks doctor availability, relays call-signaling
//! and chat frames between paired peers, and arbitrates who may start a
//! call with whom.
//!
//! # Architecture
//!
//! A single [`actors::HubActor`] owns all shared mutable state:
//!
//! ```text
//! HubActor (singleton per hub instance)
//! ├── session registry (user id -> one live connection)
//! ├── presence state machine (ONLINE/BUSY/OFFLINE per doctor)
//! ├── call-session arbitration (call-start / call-end)
//! └── presence broadcaster (best-effort fan-out to every session)
//! ```
//!
//! Each admitted connection runs its own receive loop ([`ws`]) and talks to
//! the hub actor over a bounded mailbox. Because the actor processes one
//! command at a time, the check-then-act sequence behind `call-start` can
//! never interleave with another request for the same doctor.
//!
//! # Key Design Decisions
//!
//! - **One session per user**: admitting a new connection for a user id
//!   replaces the prior entry; the old connection becomes unreachable for
//!   delivery but is not forcibly closed.
//! - **Best-effort delivery**: relays and broadcasts are single attempts
//!   with no queueing, acknowledgment, or retry.
//! - **Directory as system of record**: all presence mutations go through
//!   the [`directory::UserDirectory`] collaborator; the hub actor is its
//!   sole writer.
//!
//! # Modules
//!
//! - [`actors`] - Hub actor, mailbox messages, session registry
//! - [`auth`] - Connection authentication at upgrade time
//! - [`config`] - Service configuration from environment
//! - [`directory`] - External User Directory contract + in-memory impl
//! - [`errors`] - Error taxonomy
//! - [`observability`] - Health endpoints
//! - [`protocol`] - Wire frame model (closed tagged variants)
//! - [`ws`] - WebSocket upgrade handler and per-connection loop

pub mod actors;
pub mod auth;
pub mod config;
pub mod directory;
pub mod errors;
pub mod observability;
pub mod protocol;
pub mod ws;
