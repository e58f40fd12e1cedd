//! Secret resolution with optional keyring support
//!
//! A secret value in the configuration is either plaintext or a
//! `keyring:<name>` reference. References are looked up in the OS keyring
//! when the `secure-storage` feature is enabled.

use super::error::{ConfigError, Result};

/// Prefix that indicates a value should be retrieved from the keyring
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "redisconn";

/// Storage backend for credentials
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CredentialStorage {
    /// OS keyring
    #[cfg(feature = "secure-storage")]
    Keyring,
    /// Plaintext values only
    Plaintext,
}

/// Credential store abstraction
#[derive(Debug)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Create a new credential store with automatic backend selection
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            if Self::is_keyring_available() {
                return Self {
                    storage: CredentialStorage::Keyring,
                };
            }
        }
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    /// Check if keyring is available on this system
    #[cfg(feature = "secure-storage")]
    fn is_keyring_available() -> bool {
        match keyring::Entry::new(SERVICE_NAME, "__probe__") {
            Ok(entry) => {
                let _ = entry.get_password();
                true
            }
            Err(_) => false,
        }
    }

    /// Resolve a configured secret
    ///
    /// `keyring:<name>` values are read from the keyring, anything else is
    /// returned as-is.
    pub fn resolve(&self, value: &str) -> Result<String> {
        let Some(key) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                entry.get_password().map_err(|e| {
                    ConfigError::KeyringError(format!(
                        "Failed to retrieve credential '{}' from keyring: {}",
                        key, e
                    ))
                })
            }
            CredentialStorage::Plaintext => Err(ConfigError::CredentialError(format!(
                "'{}' references the keyring but no keyring is available (build with the secure-storage feature)",
                key
            ))),
        }
    }

    /// Resolve a configured secret, touching the keyring only for references
    pub fn resolve_value(value: &str) -> Result<String> {
        if Self::is_keyring_reference(value) {
            Self::new().resolve(value)
        } else {
            Ok(value.to_string())
        }
    }

    /// Backend that would serve `value`, without probing for plaintext
    pub fn backend_for(value: Option<&str>) -> &'static str {
        match value {
            Some(v) if Self::is_keyring_reference(v) => Self::new().storage_backend(),
            _ => "plaintext",
        }
    }

    /// Check if a value is a keyring reference
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Name of the active storage backend
    pub fn storage_backend(&self) -> &'static str {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => "keyring",
            CredentialStorage::Plaintext => "plaintext",
        }
    }
}
