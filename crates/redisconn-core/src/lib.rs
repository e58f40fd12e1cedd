//! # redisconn-core
//!
//! Connection configuration for Redis clients: read environment-provided
//! settings, decide which connection strategy applies, derive validated
//! connection parameters and supervise the resulting client.
//!
//! ## Pipeline
//!
//! ```text
//! ConfigSnapshot ──► resolve() ──► ConnectionMethod::derive() ──► connect() ──► ClientHandle
//!   (config)         (strategy)        (descriptor)                (supervisor)
//! ```
//!
//! Supported strategies, selected with `REDIS_CONNECTION_METHOD`:
//!
//! | Selector | Inputs |
//! |---|---|
//! | `cloud-platform` | `REDIS_CLOUD_PLATFORM_TARGET`, `VCAP_SERVICES` |
//! | `direct-ssl-tls` | `REDIS_CERT`, `REDIS_URL` |
//! | `basic-auth` | `REDIS_INSTANCE_URL`, `REDIS_BASIC_AUTH_PASS`, `REDIS_BASIC_AUTH_USER` |
//! | `no-auth` | `REDIS_INSTANCE_URL` |
//!
//! ## Example
//!
//! ```rust,no_run
//! use redisconn_core::{KvStore, Setup};
//!
//! # async fn run() -> redisconn_core::Result<()> {
//! let setup = Setup::from_env();
//! if let Some(handle) = setup.client().await {
//!     let store = KvStore::from_snapshot(&handle, setup.snapshot())?;
//!     let session = store.get("session:42").await?;
//!     println!("{session:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod setup;
pub mod store;
pub mod strategy;
pub mod supervisor;

// Underlying client, for callers that issue commands on the handle directly
pub use redis;

pub use config::{ClientSettings, ConfigError, ConfigSnapshot, ReconnectConfig, vars};
pub use descriptor::{AuthMaterial, ConnectionDescriptor, DerivationError, TlsMaterial};
pub use error::{Error, Result};
pub use setup::Setup;
pub use store::{Fields, KvStore};
pub use strategy::{
    CloudPlatform, ConnectionMethod, MethodKind, NotConfigured, Resolution, Unmet, resolve,
};
pub use supervisor::{
    ClientEvent, ClientHandle, ClientState, ConnectionError, EventSink, Lifecycle, Opened,
    ReadySignal, RedisTransport, Transport, connect,
};
