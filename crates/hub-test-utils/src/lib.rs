//! # Hub Test Utilities
//!
//! Shared test helpers for the Telemed Hub:
//! - Credential token builders for exercising the connection authenticator
//!
//! ## Usage
//!
//! ```rust
//! use common::types::{Role, UserId};
//! use hub_test_utils::{token_for, TEST_JWT_SECRET};
//!
//! let token = token_for(UserId(1), Role::Doctor, TEST_JWT_SECRET);
//! assert!(!token.is_empty());
//! ```

pub mod token_builders;

pub use token_builders::*;
