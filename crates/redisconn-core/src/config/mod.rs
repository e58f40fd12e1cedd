//! Configuration loading for Redis connection setup
//!
// Allow nested config module - this is intentional for the config subsystem
#![allow(clippy::module_inception)]
//!
//! # Features
//!
//! - Environment variables as the primary source
//! - Optional TOML layer with `${VAR}` expansion underneath the environment
//! - Deferred parsing of the extra client options blob
//! - Secure secret storage using the OS keyring (optional)

pub mod config;
pub mod credential;
pub mod error;
pub mod options;

// Re-export main types for convenience
pub use config::{ConfigSnapshot, vars};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use options::{ClientSettings, KEY_PREFIX_OPTION, ReconnectConfig};
