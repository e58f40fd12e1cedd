//! Unified error handling for redisconn-core
//!
//! Wraps the error of each layer with consistent helper methods.
//!
//! # Example
//!
//! ```rust
//! use redisconn_core::{ConfigError, Error};
//!
//! let err: Error = ConfigError::PrefixMissing.into();
//! assert!(err.is_config());
//! assert!(!err.is_retryable());
//! ```

use thiserror::Error;

use crate::config::ConfigError;
use crate::descriptor::DerivationError;
use crate::strategy::NotConfigured;
use crate::supervisor::ConnectionError;

/// Core error type covering every setup stage and store operation
#[derive(Error, Debug)]
pub enum Error {
    /// Fatal configuration precondition
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Strategy selected but not fully configured
    #[error(transparent)]
    NotConfigured(#[from] NotConfigured),

    /// Descriptor could not be derived
    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    /// Connection could not be opened or became unusable
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Command failed against a ready connection
    #[error("Redis error: {0}")]
    Store(#[from] redis::RedisError),

    /// Key is empty
    #[error("key must not be empty")]
    EmptyKey,

    /// Field map is empty
    #[error("at least one field is required")]
    EmptyFields,
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true for fatal configuration errors
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Returns true when a strategy is selected but incomplete
    #[must_use]
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Error::NotConfigured(_))
    }

    /// Returns true for invalid arguments caught before any command is sent
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::EmptyKey | Error::EmptyFields)
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connection(e) => e.is_retryable(),
            Error::Store(e) => e.is_io_error() || e.is_timeout() || e.is_connection_dropped(),
            _ => false,
        }
    }
}
