//! Command implementations

use redisconn_core::redis::aio::ConnectionManager;
use redisconn_core::{ClientHandle, ConfigSnapshot, RedisTransport, Setup};
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::error::Result;

pub mod check;
pub mod kv;
pub mod watch;

/// Run the parsed command against `snapshot`
pub async fn execute(cli: &Cli, snapshot: ConfigSnapshot) -> Result<()> {
    let setup = Setup::new(snapshot);

    match &cli.command {
        Commands::Check => check::run(&setup, cli.output).await,
        Commands::Ping => kv::ping(&connect(&setup).await?, cli.output).await,
        Commands::Watch => watch::run(&connect(&setup).await?, cli.output).await,
        Commands::Get { key } => kv::get(&setup, &connect(&setup).await?, key, cli.output).await,
        Commands::Set {
            key,
            fields,
            expire,
        } => {
            let handle = connect(&setup).await?;
            kv::set(&setup, &handle, key, fields, *expire, cli.output).await
        }
        Commands::Update { key, fields } => {
            let handle = connect(&setup).await?;
            kv::update(&setup, &handle, key, fields, cli.output).await
        }
        Commands::Del { key } => kv::delete(&setup, &connect(&setup).await?, key, cli.output).await,
    }
}

/// Connect with the real transport, keeping the failure for the diagnostic
async fn connect(setup: &Setup) -> Result<ClientHandle<ConnectionManager>> {
    let handle = setup.connect_with(&RedisTransport::new()).await?;
    debug!(prefix = %handle.key_prefix(), "connected");
    Ok(handle)
}
