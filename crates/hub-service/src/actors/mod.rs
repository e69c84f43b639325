//! Actor layer for the hub.
//!
//! A single [`HubActor`] owns the session registry, the presence state
//! machine, and call arbitration. Connections talk to it through a cloneable
//! [`HubActorHandle`] over a bounded mailbox, so every check-then-act
//! sequence is serialized through one run loop.

pub mod hub;
pub mod messages;

pub use hub::{HubActor, HubActorHandle};
pub use messages::{HubMessage, HubStatus, SessionId};
