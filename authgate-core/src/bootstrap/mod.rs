//! Startup sequence for the gateway
//!
//! This module handles:
//! - Configuration loading
//! - Session store initialization
//! - Provider selection and configuration
//! - Freezing the result into an immutable `AppContext`

pub mod config;
pub mod context;
pub mod error;
pub mod startup;

pub use config::{load_config, ConfigSource};
pub use context::AppContext;
pub use error::StartupError;
pub use startup::bootstrap;
