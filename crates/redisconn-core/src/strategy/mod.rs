//! Connection strategy resolution
//!
//! Decides which of the four connection methods is configured and whether its
//! prerequisites are in place. Missing fundamentals (prefix, method selector)
//! are hard [`ConfigError`]s. Incomplete strategy prerequisites are the softer
//! [`Resolution::NotConfigured`] outcome: logged, returned, never raised.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{ConfigError, ConfigSnapshot, vars};

pub mod platform;

pub use platform::{BrokerCredentials, CloudPlatform};

/// Secure URL scheme required by TLS strategies
pub const SECURE_SCHEME: &str = "rediss://";

/// The connection method selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMethod {
    /// Credentials brokered by a cloud platform service binding
    CloudPlatform(CloudPlatform),
    /// TLS with a CA certificate file and a composed `rediss://` URL
    DirectTls,
    /// Password (and optional ACL user) over an instance URL
    BasicAuth,
    /// Plain instance URL
    NoAuth,
}

/// Method selector without its platform payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    CloudPlatform,
    DirectTls,
    BasicAuth,
    NoAuth,
}

impl MethodKind {
    pub const ALL: [MethodKind; 4] = [
        MethodKind::CloudPlatform,
        MethodKind::DirectTls,
        MethodKind::BasicAuth,
        MethodKind::NoAuth,
    ];

    /// Literal selector value
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::CloudPlatform => "cloud-platform",
            MethodKind::DirectTls => "direct-ssl-tls",
            MethodKind::BasicAuth => "basic-auth",
            MethodKind::NoAuth => "no-auth",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::MethodUnsupported(s.to_string()))
    }
}

impl ConnectionMethod {
    pub fn kind(&self) -> MethodKind {
        match self {
            ConnectionMethod::CloudPlatform(_) => MethodKind::CloudPlatform,
            ConnectionMethod::DirectTls => MethodKind::DirectTls,
            ConnectionMethod::BasicAuth => MethodKind::BasicAuth,
            ConnectionMethod::NoAuth => MethodKind::NoAuth,
        }
    }

    /// Whether this method always connects over TLS
    pub fn requires_tls(&self) -> bool {
        matches!(
            self,
            ConnectionMethod::CloudPlatform(_) | ConnectionMethod::DirectTls
        )
    }
}

impl fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMethod::CloudPlatform(platform) => {
                write!(f, "{} ({})", self.kind(), platform)
            }
            _ => write!(f, "{}", self.kind()),
        }
    }
}

/// A prerequisite the selected strategy is missing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Unmet {
    #[error("no value was configured for '{var}'", var = vars::CLOUD_PLATFORM)]
    PlatformMissing,

    #[error("the cloud platform configured is not supported: '{0}'")]
    PlatformUnsupported(String),

    #[error("no value was configured for '{var}'", var = vars::BROKER_PAYLOAD)]
    BrokerPayloadMissing,

    #[error(
        "no value was configured for '{cert}' or '{ssl}'",
        cert = vars::CERT,
        ssl = vars::SSL_CERT
    )]
    CertificatePathMissing,

    #[error(
        "no value was configured for '{url}' or '{composed}'",
        url = vars::URL,
        composed = vars::COMPOSED_URL
    )]
    ComposedUrlMissing,

    #[error("the composed URL must start with '{scheme}'", scheme = SECURE_SCHEME)]
    ComposedUrlNotSecure,

    #[error("no value was configured for '{var}'", var = vars::INSTANCE_URL)]
    InstanceUrlMissing,

    #[error("no value was configured for '{var}'", var = vars::BASIC_AUTH_PASS)]
    PasswordMissing,
}

/// Strategy selected but its prerequisites are incomplete
#[derive(Error, Debug, Clone, PartialEq)]
#[error("connection method '{method}' is not fully configured: {}", list(.unmet))]
pub struct NotConfigured {
    pub method: MethodKind,
    pub unmet: Vec<Unmet>,
}

fn list(unmet: &[Unmet]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of a successful resolution pass
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The method is selected and its prerequisites are present
    Ready(ConnectionMethod),
    /// The method is selected but cannot be used yet
    NotConfigured(NotConfigured),
}

impl Resolution {
    pub fn is_ready(&self) -> bool {
        matches!(self, Resolution::Ready(_))
    }

    /// Collapse into a plain result
    pub fn into_result(self) -> Result<ConnectionMethod, NotConfigured> {
        match self {
            Resolution::Ready(method) => Ok(method),
            Resolution::NotConfigured(not_configured) => Err(not_configured),
        }
    }
}

/// Decide which connection method applies to `snapshot`
///
/// Validation order:
/// 1. prefix present
/// 2. method selector present
/// 3. selector is one of the four supported names
/// 4. strategy-specific readiness
pub fn resolve(snapshot: &ConfigSnapshot) -> Result<Resolution, ConfigError> {
    debug!("checking if redis db connection is possible");

    snapshot.require_prefix()?;

    let selector = snapshot
        .connection_method
        .as_deref()
        .ok_or(ConfigError::MethodUndefined)?;
    let kind: MethodKind = selector.parse()?;

    debug!(method = %kind, "checking connection method prerequisites");

    let (method, unmet) = match kind {
        MethodKind::CloudPlatform => cloud_platform_readiness(snapshot),
        MethodKind::DirectTls => (Some(ConnectionMethod::DirectTls), direct_tls_readiness(snapshot)),
        MethodKind::BasicAuth => (Some(ConnectionMethod::BasicAuth), basic_auth_readiness(snapshot)),
        MethodKind::NoAuth => (Some(ConnectionMethod::NoAuth), no_auth_readiness(snapshot)),
    };

    match method {
        Some(method) if unmet.is_empty() => {
            debug!(method = %method, "connection method ready");
            Ok(Resolution::Ready(method))
        }
        _ => {
            for reason in &unmet {
                error!(method = %kind, "{}", reason);
            }
            Ok(Resolution::NotConfigured(NotConfigured {
                method: kind,
                unmet,
            }))
        }
    }
}

fn cloud_platform_readiness(snapshot: &ConfigSnapshot) -> (Option<ConnectionMethod>, Vec<Unmet>) {
    let mut unmet = Vec::new();

    let platform = match snapshot.cloud_platform.as_deref() {
        None => {
            unmet.push(Unmet::PlatformMissing);
            None
        }
        Some(name) => match name.parse::<CloudPlatform>() {
            Ok(platform) => Some(platform),
            Err(_) => {
                unmet.push(Unmet::PlatformUnsupported(name.to_string()));
                None
            }
        },
    };

    if snapshot.broker_payload.is_none() {
        unmet.push(Unmet::BrokerPayloadMissing);
    }

    (platform.map(ConnectionMethod::CloudPlatform), unmet)
}

fn direct_tls_readiness(snapshot: &ConfigSnapshot) -> Vec<Unmet> {
    let mut unmet = Vec::new();

    if snapshot.certificate_path.is_none() {
        unmet.push(Unmet::CertificatePathMissing);
    }
    match snapshot.composed_url.as_deref() {
        None => unmet.push(Unmet::ComposedUrlMissing),
        Some(url) if !url.starts_with(SECURE_SCHEME) => unmet.push(Unmet::ComposedUrlNotSecure),
        Some(_) => {}
    }

    unmet
}

fn basic_auth_readiness(snapshot: &ConfigSnapshot) -> Vec<Unmet> {
    let mut unmet = no_auth_readiness(snapshot);

    if snapshot.auth_password.is_none() {
        unmet.push(Unmet::PasswordMissing);
    }
    if snapshot.auth_user.is_none() {
        info!(
            "no value was found for '{}', the connection will be attempted without a user",
            vars::BASIC_AUTH_USER
        );
    }

    unmet
}

fn no_auth_readiness(snapshot: &ConfigSnapshot) -> Vec<Unmet> {
    if snapshot.instance_url.is_none() {
        vec![Unmet::InstanceUrlMissing]
    } else {
        Vec::new()
    }
}
