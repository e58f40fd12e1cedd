//! Error types for configuration operations

use thiserror::Error;

use super::config::vars;

/// Errors that can occur while reading or consuming configuration
///
/// Everything here is a fatal precondition: setup cannot continue and the
/// caller gets no client.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no value defined for '{var}', which is mandatory", var = vars::PREFIX)]
    PrefixMissing,

    #[error("no value defined for '{var}'", var = vars::CONNECTION_METHOD)]
    MethodUndefined,

    #[error(
        "'{0}' is not a supported value for '{method}' (expected one of: cloud-platform, direct-ssl-tls, basic-auth, no-auth)",
        method = vars::CONNECTION_METHOD
    )]
    MethodUnsupported(String),

    #[error(
        "the value configured for '{var}' is not a valid JSON object: {source}",
        var = vars::CLIENT_OPTIONS
    )]
    ClientOptionsParse {
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "'{value}' is not a valid number of seconds for '{var}'",
        var = vars::DEFAULT_EXPIRATION
    )]
    InvalidExpiration {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Failed to load config from {path}: {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to resolve credential: {0}")]
    CredentialError(String),

    #[cfg(feature = "secure-storage")]
    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Failed to determine config directory")]
    ConfigDirError,
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
