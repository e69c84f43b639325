//! Observability for the hub.
//!
//! Health endpoints only; log output is configured in `main` via
//! `tracing-subscriber`.

pub mod health;

pub use health::{health_router, HealthState};
