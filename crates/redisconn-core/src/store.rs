//! Hash-based key-value facade over a ready client
//!
//! Every key is namespaced with the descriptor's key prefix. Values are Redis
//! hashes; expiration is applied with `EXPIRE` after each write.

use redis::aio::ConnectionManager;
use std::collections::HashMap;
use tracing::debug;

use crate::config::ConfigSnapshot;
use crate::error::{Error, Result};
use crate::supervisor::{ClientHandle, ConnectionError, Lifecycle};

/// Field map stored under one key
pub type Fields = HashMap<String, String>;

/// Key-value operations against a supervised connection
#[derive(Clone)]
pub struct KvStore {
    connection: ConnectionManager,
    state: tokio::sync::watch::Receiver<Lifecycle>,
    prefix: String,
    default_expiration: Option<u64>,
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("prefix", &self.prefix)
            .field("default_expiration", &self.default_expiration)
            .finish_non_exhaustive()
    }
}

impl KvStore {
    /// Store over a handle, with an optional default expiration in seconds
    pub fn new(handle: &ClientHandle<ConnectionManager>, default_expiration: Option<u64>) -> Self {
        Self {
            connection: handle.connection().clone(),
            state: handle.subscribe(),
            prefix: handle.key_prefix().to_string(),
            default_expiration,
        }
    }

    /// Store using the snapshot's default expiration
    pub fn from_snapshot(
        handle: &ClientHandle<ConnectionManager>,
        snapshot: &ConfigSnapshot,
    ) -> Result<Self> {
        Ok(Self::new(handle, snapshot.default_expiration()?))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// All fields of `key`, or `None` when the hash is empty or absent
    pub async fn get(&self, key: &str) -> Result<Option<Fields>> {
        let key = self.prepare(key)?;
        let mut conn = self.connection.clone();

        let fields: Fields = redis::cmd("HGETALL")
            .arg(&key)
            .query_async(&mut conn)
            .await?;

        debug!(key = %key, fields = fields.len(), "HGETALL");
        Ok(if fields.is_empty() { None } else { Some(fields) })
    }

    /// Write `fields` under `key`, then apply `expire` or the default expiration
    pub async fn set(&self, key: &str, fields: &Fields, expire: Option<u64>) -> Result<()> {
        let key = self.prepare(key)?;
        if fields.is_empty() {
            return Err(Error::EmptyFields);
        }
        let mut conn = self.connection.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().cmd("HSET").arg(&key).arg(field_args(fields)).ignore();
        if let Some(seconds) = expire.or(self.default_expiration) {
            pipe.cmd("EXPIRE").arg(&key).arg(seconds).ignore();
        }
        pipe.query_async::<()>(&mut conn).await?;

        debug!(key = %key, fields = fields.len(), "HSET");
        Ok(())
    }

    /// Merge `fields` into an existing hash
    ///
    /// Returns `false` without writing when `key` does not exist.
    pub async fn update(&self, key: &str, fields: &Fields) -> Result<bool> {
        if fields.is_empty() {
            return Err(Error::EmptyFields);
        }
        if self.get(key).await?.is_none() {
            debug!(key = %key, "update skipped, key does not exist");
            return Ok(false);
        }
        self.set(key, fields, None).await?;
        Ok(true)
    }

    /// Round-trip a `PING`
    pub async fn ping(&self) -> Result<String> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }

    /// Remove `key`, returning whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let key = self.prepare(key)?;
        let mut conn = self.connection.clone();

        let removed: i64 = redis::cmd("DEL").arg(&key).query_async(&mut conn).await?;
        debug!(key = %key, removed, "DEL");
        Ok(removed > 0)
    }

    /// Validate and namespace a key, refusing to run on a failed client
    fn prepare(&self, key: &str) -> Result<String> {
        let key = namespaced(&self.prefix, key)?;
        let lifecycle = self.state.borrow();
        if lifecycle.is_failed() {
            return Err(ConnectionError::Failed(
                lifecycle
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "client failed".to_string()),
            )
            .into());
        }
        Ok(key)
    }
}

fn namespaced(prefix: &str, key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(Error::EmptyKey);
    }
    Ok(format!("{prefix}{key}"))
}

fn field_args(fields: &Fields) -> Vec<(&str, &str)> {
    let mut args: Vec<(&str, &str)> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    args.sort_unstable();
    args
}
