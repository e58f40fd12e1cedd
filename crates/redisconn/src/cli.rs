//! CLI structure and command definitions

use clap::{Parser, Subcommand};

/// Inspect and use an environment-configured Redis connection
#[derive(Parser, Debug)]
#[command(name = "redisconn")]
#[command(
    version,
    about = "Inspect and use environment-configured Redis connections"
)]
#[command(long_about = "
Inspect and use environment-configured Redis connections

The connection is described entirely by environment variables (optionally
layered over a TOML file):
    REDIS_PREFIX               key namespace (required)
    REDIS_CONNECTION_METHOD    cloud-platform | direct-ssl-tls | basic-auth | no-auth
    REDIS_CLIENT_OPTS          extra client options as a JSON object

EXAMPLES:
    # Show which connection method is configured, without connecting
    redisconn check

    # Verify the server answers
    redisconn ping

    # Follow lifecycle transitions until Ctrl-C
    redisconn watch

    # Hash operations under the configured prefix
    redisconn set session:42 user=ada role=admin --expire 3600
    redisconn get session:42 -o yaml
    redisconn update session:42 role=viewer
    redisconn del session:42

For more help on a specific command, run:
    redisconn <command> --help
")]
pub struct Cli {
    /// Path to a TOML configuration file layered under the environment
    #[arg(long, global = true, env = "REDISCONN_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the connection method and derive its parameters without connecting
    #[command(after_help = "EXAMPLES:
    REDIS_PREFIX=app: REDIS_CONNECTION_METHOD=no-auth \\
        REDIS_INSTANCE_URL=redis://localhost:6379 redisconn check
")]
    Check,

    /// Connect and send PING
    Ping,

    /// Connect and print lifecycle transitions until Ctrl-C or failure
    Watch,

    /// Read all fields of a hash
    Get {
        /// Key, without the configured prefix
        key: String,
    },

    /// Write fields to a hash
    #[command(after_help = "EXAMPLES:
    redisconn set session:42 user=ada role=admin
    redisconn set session:42 user=ada --expire 60
")]
    Set {
        /// Key, without the configured prefix
        key: String,

        /// Fields as field=value pairs
        #[arg(required = true, value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Expiration in seconds (defaults to REDIS_DEFAULT_EXP)
        #[arg(long)]
        expire: Option<u64>,
    },

    /// Merge fields into an existing hash
    Update {
        /// Key, without the configured prefix
        key: String,

        /// Fields as field=value pairs
        #[arg(required = true, value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Delete a key
    #[command(visible_alias = "delete")]
    Del {
        /// Key, without the configured prefix
        key: String,
    },
}

impl Commands {
    /// Whether the command needs a live connection
    pub fn needs_connection(&self) -> bool {
        !matches!(self, Commands::Check)
    }
}

/// Parse a `field=value` argument
fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected field=value, got '{s}'")),
    }
}
