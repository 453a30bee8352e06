//! Proctor Common Utilities
//!
//! Shared infrastructure for all Proctor crates:
//! - Error types and result aliases
//! - Layered analysis configuration (defaults, file, environment, flags)
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
