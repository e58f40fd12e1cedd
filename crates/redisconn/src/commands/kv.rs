//! `ping`, `get`, `set`, `update` and `del`

use redisconn_core::redis::aio::ConnectionManager;
use redisconn_core::{ClientHandle, Fields, KvStore, Setup};
use serde_json::json;
use std::time::Instant;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::print_output;

pub async fn ping(handle: &ClientHandle<ConnectionManager>, format: OutputFormat) -> Result<()> {
    let store = KvStore::new(handle, None);

    let start = Instant::now();
    let response = store.ping().await?;
    let latency_ms = start.elapsed().as_millis() as u64;

    print_output(
        json!({
            "response": response,
            "latency_ms": latency_ms,
            "state": handle.state(),
        }),
        format,
    )?;
    Ok(())
}

pub async fn get(
    setup: &Setup,
    handle: &ClientHandle<ConnectionManager>,
    key: &str,
    format: OutputFormat,
) -> Result<()> {
    let store = KvStore::from_snapshot(handle, setup.snapshot())?;
    let fields = store.get(key).await?;

    print_output(json!({ "key": key, "fields": fields }), format)?;
    Ok(())
}

pub async fn set(
    setup: &Setup,
    handle: &ClientHandle<ConnectionManager>,
    key: &str,
    fields: &[(String, String)],
    expire: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let store = KvStore::from_snapshot(handle, setup.snapshot())?;
    let fields = to_fields(fields);
    store.set(key, &fields, expire).await?;

    print_output(
        json!({
            "key": key,
            "fields": fields.len(),
            "expire": expire.or(setup.snapshot().default_expiration()?),
        }),
        format,
    )?;
    Ok(())
}

pub async fn update(
    setup: &Setup,
    handle: &ClientHandle<ConnectionManager>,
    key: &str,
    fields: &[(String, String)],
    format: OutputFormat,
) -> Result<()> {
    let store = KvStore::from_snapshot(handle, setup.snapshot())?;
    let updated = store.update(key, &to_fields(fields)).await?;

    print_output(json!({ "key": key, "updated": updated }), format)?;
    Ok(())
}

pub async fn delete(
    setup: &Setup,
    handle: &ClientHandle<ConnectionManager>,
    key: &str,
    format: OutputFormat,
) -> Result<()> {
    let store = KvStore::from_snapshot(handle, setup.snapshot())?;
    let deleted = store.delete(key).await?;

    print_output(json!({ "key": key, "deleted": deleted }), format)?;
    Ok(())
}

/// Later duplicates of a field win
fn to_fields(pairs: &[(String, String)]) -> Fields {
    pairs.iter().cloned().collect()
}
