//! Configuration errors.
//!
//! Runtime failures (SNMP, sink) have their own error types in [`crate::snmp`]
//! and [`crate::sink`]; none of them escape a single host's poller.

use thiserror::Error;

/// Fatal configuration problems, reported before any poller starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<tripoll_common::Error> for ConfigError {
    fn from(err: tripoll_common::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
