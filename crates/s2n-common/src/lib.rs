//! Shared types for the Specify Network broker crates
//!
//! Holds the cross-crate error type and the logging setup used by every
//! binary in the workspace.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

pub use error::{Result, S2nError};
