//! Error types for redisconn
//!
//! Wraps library errors with environment-variable tips and prints them as
//! cargo-style diagnostics.

use colored::Colorize;
use redisconn_core::config::ConfigError;
use redisconn_core::strategy::{MethodKind, NotConfigured, Unmet};
use redisconn_core::{ConnectionError, DerivationError, vars};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: no value defined for 'REDIS_PREFIX', which is mandatory
///
///   tip: set a key namespace for this application:
///       export REDIS_PREFIX=myapp:
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the redisconn application
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    NotConfigured(#[from] NotConfigured),

    #[error("{0}")]
    Derivation(#[from] DerivationError),

    #[error("{0}")]
    Connection(#[from] ConnectionError),

    #[error("Redis command failed: {0}")]
    Command(String),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for redisconn operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<redisconn_core::Error> for CliError {
    fn from(err: redisconn_core::Error) -> Self {
        use redisconn_core::Error;
        match err {
            Error::Config(e) => CliError::Config(e),
            Error::NotConfigured(e) => CliError::NotConfigured(e),
            Error::Derivation(e) => CliError::Derivation(e),
            Error::Connection(e) => CliError::Connection(e),
            Error::Store(e) => CliError::Command(e.to_string()),
            e @ (Error::EmptyKey | Error::EmptyFields) => CliError::InvalidInput {
                message: e.to_string(),
            },
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::OutputError {
            message: err.to_string(),
        }
    }
}

impl CliError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<(String, Vec<String>)> {
        match self {
            CliError::Config(ConfigError::PrefixMissing) => vec![(
                "set a key namespace for this application:".to_string(),
                vec![format!("export {}=myapp:", vars::PREFIX)],
            )],
            CliError::Config(ConfigError::MethodUndefined)
            | CliError::Config(ConfigError::MethodUnsupported(_)) => vec![(
                "choose one of the supported connection methods:".to_string(),
                MethodKind::ALL
                    .iter()
                    .map(|kind| format!("export {}={}", vars::CONNECTION_METHOD, kind))
                    .collect(),
            )],
            CliError::Config(ConfigError::ClientOptionsParse { .. })
            | CliError::Derivation(DerivationError::Config(ConfigError::ClientOptionsParse {
                ..
            })) => vec![(
                "client options must be a JSON object:".to_string(),
                vec![format!(r#"export {}='{{"db": 1}}'"#, vars::CLIENT_OPTIONS)],
            )],
            CliError::Config(ConfigError::ParseError(_)) => vec![(
                "check the TOML syntax of the configuration file".to_string(),
                vec![],
            )],
            CliError::NotConfigured(not_configured) => not_configured
                .unmet
                .iter()
                .map(|unmet| (unmet.to_string(), unmet_commands(unmet)))
                .collect(),
            CliError::Derivation(DerivationError::CertificateRead { path, .. }) => vec![(
                format!("check that the certificate file exists and is readable: {}", path),
                vec![],
            )],
            CliError::Derivation(DerivationError::InvalidSchemeForTls { .. }) => vec![(
                "TLS connections need a rediss:// URL".to_string(),
                vec![format!("export {}=rediss://host:port", vars::URL)],
            )],
            CliError::Connection(ConnectionError::ReadyTimeout(_)) => vec![
                ("check that the server is reachable from this host".to_string(), vec![]),
                (
                    "raise the wait with the readyTimeoutMs client option".to_string(),
                    vec![format!(r#"export {}='{{"readyTimeoutMs": 60000}}'"#, vars::CLIENT_OPTIONS)],
                ),
            ],
            CliError::Connection(e) if is_auth_failure(&e.to_string()) => vec![(
                "verify the configured credentials".to_string(),
                vec![
                    format!("echo ${}", vars::BASIC_AUTH_USER),
                    "redisconn check".to_string(),
                ],
            )],
            CliError::Connection(_) => vec![(
                "inspect the resolved connection without dialing".to_string(),
                vec!["redisconn check".to_string()],
            )],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        if let CliError::NotConfigured(not_configured) = self {
            diag = diag.detail(&format!(
                "{} prerequisite(s) missing for '{}'",
                not_configured.unmet.len(),
                not_configured.method
            ));
        }

        for (description, commands) in self.suggestions() {
            let commands: Vec<&str> = commands.iter().map(String::as_str).collect();
            diag = diag.tip(&description, &commands);
        }

        diag.print();
    }
}

fn unmet_commands(unmet: &Unmet) -> Vec<String> {
    let example = match unmet {
        Unmet::PlatformMissing | Unmet::PlatformUnsupported(_) => {
            format!("export {}=ibmcloud", vars::CLOUD_PLATFORM)
        }
        Unmet::BrokerPayloadMissing => format!("export {}='{{...}}'", vars::BROKER_PAYLOAD),
        Unmet::CertificatePathMissing => format!("export {}=/path/to/ca.pem", vars::CERT),
        Unmet::ComposedUrlMissing | Unmet::ComposedUrlNotSecure => {
            format!("export {}=rediss://host:port", vars::URL)
        }
        Unmet::InstanceUrlMissing => format!("export {}=redis://host:6379", vars::INSTANCE_URL),
        Unmet::PasswordMissing => format!("export {}=<password>", vars::BASIC_AUTH_PASS),
    };
    vec![example]
}

fn is_auth_failure(message: &str) -> bool {
    message.contains("WRONGPASS")
        || message.contains("NOAUTH")
        || message.contains("invalid username-password")
}
