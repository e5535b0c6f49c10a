//! Configuration system for the glyphd font service.
//!
//! This crate provides configuration loading, saving, validation and default
//! values for the font worker and the `glyphd` command-line front end.

pub mod config;
pub mod defaults;
pub mod error;
mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::ConfigError;
pub use types::LogLevel;
