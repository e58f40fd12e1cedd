//! `watch`: follow lifecycle transitions

use redisconn_core::redis::aio::ConnectionManager;
use redisconn_core::{ClientHandle, ConnectionError};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::print_output;

pub async fn run(handle: &ClientHandle<ConnectionManager>, format: OutputFormat) -> Result<()> {
    let mut states = handle.subscribe();
    print_output(states.borrow_and_update().clone(), format)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, stopping watch");
                return Ok(());
            }
            changed = states.changed() => {
                if changed.is_err() {
                    return Err(ConnectionError::Closed.into());
                }

                let lifecycle = states.borrow_and_update().clone();
                print_output(&lifecycle, format)?;

                if lifecycle.is_failed() {
                    return Err(ConnectionError::Failed(
                        lifecycle
                            .last_error
                            .unwrap_or_else(|| "client failed".to_string()),
                    )
                    .into());
                }
            }
        }
    }
}
