//! Cartas Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other Cartas crates:
//! - Application configuration (API URL, storage, generation defaults)
//! - Global error type covering network, validation and upsell failures
//! - Structured logging with tracing
//! - Platform directory resolution
//! - Common constants and user-facing strings

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{CtError, CtResult};
pub use logging::init_logging;
