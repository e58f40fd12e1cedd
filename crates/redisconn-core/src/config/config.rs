//! Configuration snapshot for Redis connection setup
//!
//! Values come from environment variables, optionally layered on top of a TOML
//! file. The snapshot is read once and never mutated afterwards; consumers
//! validate what they need.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use super::options::{ClientSettings, KEY_PREFIX_OPTION};

/// Environment variable names recognized by [`ConfigSnapshot::load`]
pub mod vars {
    pub const PREFIX: &str = "REDIS_PREFIX";
    pub const CONNECTION_METHOD: &str = "REDIS_CONNECTION_METHOD";
    pub const CLIENT_OPTIONS: &str = "REDIS_CLIENT_OPTS";
    pub const DEFAULT_EXPIRATION: &str = "REDIS_DEFAULT_EXP";
    pub const CLOUD_PLATFORM: &str = "REDIS_CLOUD_PLATFORM_TARGET";
    pub const BROKER_PAYLOAD: &str = "VCAP_SERVICES";
    pub const CERT: &str = "REDIS_CERT";
    pub const SSL_CERT: &str = "REDIS_SSL_CERT";
    pub const URL: &str = "REDIS_URL";
    pub const COMPOSED_URL: &str = "REDIS_COMPOSED_URL";
    pub const INSTANCE_URL: &str = "REDIS_INSTANCE_URL";
    pub const BASIC_AUTH_USER: &str = "REDIS_BASIC_AUTH_USER";
    pub const BASIC_AUTH_PASS: &str = "REDIS_BASIC_AUTH_PASS";
    pub const CONFIG_FILE: &str = "REDISCONN_CONFIG_FILE";
}

/// Immutable record of every recognized configuration key
///
/// Empty values are normalized to `None` so that "set but blank" and
/// "not set" behave the same downstream.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ConfigSnapshot {
    /// Key namespace separating this instance's data from others sharing the DB
    pub prefix: Option<String>,
    /// Connection method selector
    pub connection_method: Option<String>,
    /// Cloud platform selector (cloud-platform method)
    pub cloud_platform: Option<String>,
    /// Raw service-binding payload (cloud-platform method)
    pub broker_payload: Option<String>,
    /// Path to a PEM CA certificate (direct-ssl-tls method)
    pub certificate_path: Option<PathBuf>,
    /// Composed `rediss://` URL (direct-ssl-tls method)
    pub composed_url: Option<String>,
    /// Instance URL (basic-auth and no-auth methods)
    pub instance_url: Option<String>,
    /// Optional ACL user (basic-auth method)
    pub auth_user: Option<String>,
    /// Password, or a `keyring:` reference (basic-auth method)
    pub auth_password: Option<String>,
    /// Default expiration in seconds, coerced when consumed
    pub default_expiration: Option<String>,
    /// Serialized JSON object of extra client options, parsed when consumed
    pub client_options: Option<String>,
}

impl ConfigSnapshot {
    /// Read the snapshot from the process environment
    ///
    /// Never fails: missing values are absent and validated later.
    pub fn load() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read the snapshot through an arbitrary lookup function
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);
        let first = |a: &str, b: &str| get(a).or_else(|| get(b));

        Self {
            prefix: get(vars::PREFIX),
            connection_method: get(vars::CONNECTION_METHOD),
            cloud_platform: get(vars::CLOUD_PLATFORM),
            broker_payload: get(vars::BROKER_PAYLOAD),
            certificate_path: first(vars::CERT, vars::SSL_CERT).map(PathBuf::from),
            composed_url: first(vars::URL, vars::COMPOSED_URL),
            instance_url: get(vars::INSTANCE_URL),
            auth_user: get(vars::BASIC_AUTH_USER),
            auth_password: get(vars::BASIC_AUTH_PASS),
            default_expiration: get(vars::DEFAULT_EXPIRATION),
            client_options: get(vars::CLIENT_OPTIONS),
        }
    }

    /// Load a TOML config layer and overlay the environment on top of it
    ///
    /// File resolution order:
    /// 1. `path` if given
    /// 2. `REDISCONN_CONFIG_FILE`
    /// 3. the platform config directory (see [`ConfigSnapshot::config_path`])
    ///
    /// A missing file is not an error. Environment values always win.
    pub fn load_layered(path: Option<&Path>) -> Result<Self> {
        let file_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var(vars::CONFIG_FILE).ok().and_then(non_empty) {
                Some(p) => Some(PathBuf::from(p)),
                None => Self::config_path().ok(),
            },
        };

        let file = match file_path {
            Some(p) => Self::load_from_path(&p)?,
            None => Self::default(),
        };

        Ok(file.overlay(Self::load()))
    }

    /// Load a snapshot from a TOML file
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let snapshot: Self = toml::from_str(&expanded_content)?;

        Ok(snapshot.normalized())
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/redisconn/config.toml
    /// On macOS: ~/Library/Application Support/com.redisconn.redisconn/config.toml
    /// On Windows: %APPDATA%\redisconn\redisconn\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "redisconn", "redisconn")
            .ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Return a snapshot where every value set in `top` replaces the one here
    pub fn overlay(self, top: Self) -> Self {
        Self {
            prefix: top.prefix.or(self.prefix),
            connection_method: top.connection_method.or(self.connection_method),
            cloud_platform: top.cloud_platform.or(self.cloud_platform),
            broker_payload: top.broker_payload.or(self.broker_payload),
            certificate_path: top.certificate_path.or(self.certificate_path),
            composed_url: top.composed_url.or(self.composed_url),
            instance_url: top.instance_url.or(self.instance_url),
            auth_user: top.auth_user.or(self.auth_user),
            auth_password: top.auth_password.or(self.auth_password),
            default_expiration: top.default_expiration.or(self.default_expiration),
            client_options: top.client_options.or(self.client_options),
        }
    }

    /// The configured prefix, or `PrefixMissing`
    pub fn require_prefix(&self) -> Result<&str> {
        self.prefix.as_deref().ok_or(ConfigError::PrefixMissing)
    }

    /// Merge the default options with the user-supplied ones
    ///
    /// Defaults (`keyPrefix`) are applied first; any key the user sets
    /// replaces the default.
    pub fn client_options(&self) -> Result<Map<String, Value>> {
        let prefix = self.require_prefix()?;

        let mut options = Map::new();
        options.insert(
            KEY_PREFIX_OPTION.to_string(),
            Value::String(prefix.to_string()),
        );

        if let Some(raw) = &self.client_options {
            tracing::trace!("parsing additional redis client options");
            let additional: Map<String, Value> = serde_json::from_str(raw)
                .map_err(|source| ConfigError::ClientOptionsParse { source })?;
            options.extend(additional);
        }

        Ok(options)
    }

    /// Merged options together with their typed view
    pub fn client_settings(&self) -> Result<(Map<String, Value>, ClientSettings)> {
        let options = self.client_options()?;
        let settings = ClientSettings::from_options(&options)?;
        Ok((options, settings))
    }

    /// Default expiration in seconds, if configured
    pub fn default_expiration(&self) -> Result<Option<u64>> {
        self.default_expiration
            .as_deref()
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|source| ConfigError::InvalidExpiration {
                        value: value.to_string(),
                        source,
                    })
            })
            .transpose()
    }

    fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.and_then(non_empty);
        Self {
            prefix: clean(self.prefix),
            connection_method: clean(self.connection_method),
            cloud_platform: clean(self.cloud_platform),
            broker_payload: clean(self.broker_payload),
            certificate_path: self
                .certificate_path
                .filter(|p| !p.as_os_str().is_empty()),
            composed_url: clean(self.composed_url),
            instance_url: clean(self.instance_url),
            auth_user: clean(self.auth_user),
            auth_password: clean(self.auth_password),
            default_expiration: clean(self.default_expiration),
            client_options: clean(self.client_options),
        }
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax. Unknown variables are left
    /// as-is.
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
