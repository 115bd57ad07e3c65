//! Scout Core - shared error, configuration and logging primitives
//!
//! This crate defines the foundation the rest of the workspace builds on:
//! structured errors with context, the TOML-backed configuration surface,
//! and tracing initialization.

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
