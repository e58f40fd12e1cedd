//! `check`: resolve and derive without connecting

use redisconn_core::config::CredentialStore;
use redisconn_core::{ConnectionDescriptor, Setup};
use serde_json::{Value, json};
use tracing::info;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::print_output;

pub async fn run(setup: &Setup, format: OutputFormat) -> Result<()> {
    let descriptor = setup.descriptor().await?;
    let default_expiration = setup.snapshot().default_expiration()?;
    let storage = CredentialStore::backend_for(setup.snapshot().auth_password.as_deref());

    info!(method = %descriptor.method, "connection is fully configured");
    print_output(summary(&descriptor, default_expiration, storage), format)?;
    Ok(())
}

/// Redacted view of a descriptor
fn summary(
    descriptor: &ConnectionDescriptor,
    default_expiration: Option<u64>,
    credential_storage: &str,
) -> Value {
    json!({
        "method": descriptor.method.to_string(),
        "url": descriptor.redacted_url(),
        "tls": descriptor.tls.is_some(),
        "trust_anchors": descriptor.tls.as_ref().map_or(0, |t| t.trust_anchors.len()),
        "auth": descriptor.auth.as_ref().map(|auth| json!({
            "username": auth.username,
            "password": "***",
        })),
        "key_prefix": descriptor.key_prefix(),
        "default_expiration": default_expiration,
        "client_options": descriptor.client_options,
        "credential_storage": credential_storage,
    })
}
