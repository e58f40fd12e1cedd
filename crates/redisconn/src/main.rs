use anyhow::Result;
use clap::Parser;
use redisconn_core::ConfigSnapshot;
use std::path::PathBuf;
use tracing::{debug, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};
use error::CliError;

/// Environment variable holding a plain log level for this tool
const LOG_LEVEL_VAR: &str = "REDIS_LOG_LEVEL";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let config_path = cli.config_file.as_ref().map(PathBuf::from);
    debug!("Loading configuration, file layer: {:?}", config_path);
    let snapshot = ConfigSnapshot::load_layered(config_path.as_deref())?;

    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = commands::execute(cli, snapshot).await;
    debug!("Command finished in {:?}", start.elapsed());

    result
}

fn init_tracing(verbose: u8) {
    // RUST_LOG first, then the plain level variable, then the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else if let Some(level) = std::env::var(LOG_LEVEL_VAR)
        .ok()
        .filter(|l| !l.trim().is_empty())
    {
        let level = level.trim().to_lowercase();
        tracing_subscriber::EnvFilter::new(format!("redisconn={level},redisconn_core={level}"))
    } else {
        let level = match verbose {
            0 => "redisconn=warn,redisconn_core=warn",
            1 => "redisconn=info,redisconn_core=info",
            2 => "redisconn=debug,redisconn_core=debug",
            _ => "redisconn=trace,redisconn_core=trace,redis=debug",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

/// Command name for logging, never including field values
fn format_command(command: &Commands) -> String {
    let name = match command {
        Commands::Check => "check".to_string(),
        Commands::Ping => "ping".to_string(),
        Commands::Watch => "watch".to_string(),
        Commands::Get { .. } => "get".to_string(),
        Commands::Set { fields, .. } => format!("set ({} field(s))", fields.len()),
        Commands::Update { fields, .. } => format!("update ({} field(s))", fields.len()),
        Commands::Del { .. } => "del".to_string(),
    };

    if command.needs_connection() {
        name
    } else {
        format!("{name} [offline]")
    }
}
