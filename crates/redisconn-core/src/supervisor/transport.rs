//! Redis-backed transport
//!
//! Builds a `redis::Client` from a descriptor and keeps a
//! `ConnectionManager` observed by a periodic health ping. The manager owns
//! reconnection; the monitor only translates what it sees into lifecycle
//! events.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client, ConnectionInfo, ErrorKind, IntoConnectionInfo, RedisError, TlsCertificates};
use tracing::{debug, trace};

use super::{ClientEvent, ConnectionError, EventSink, Opened, Transport};
use crate::config::ReconnectConfig;
use crate::descriptor::ConnectionDescriptor;

/// Transport opening real Redis connections
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisTransport;

impl RedisTransport {
    pub fn new() -> Self {
        Self
    }

    /// Build the `redis::Client` for a descriptor without dialing
    pub fn client(descriptor: &ConnectionDescriptor) -> Result<Client, ConnectionError> {
        let info = connection_info(descriptor)?;

        let client = match &descriptor.tls {
            Some(tls) => Client::build_with_tls(
                info,
                TlsCertificates {
                    client_tls: None,
                    root_cert: Some(tls.pem_bundle()),
                },
            )?,
            None => Client::open(info)?,
        };

        Ok(client)
    }

    fn manager_config(descriptor: &ConnectionDescriptor) -> ConnectionManagerConfig {
        let settings = &descriptor.settings;
        let reconnect = &settings.reconnect;

        ConnectionManagerConfig::new()
            .set_number_of_retries(reconnect.retries)
            .set_exponent_base(reconnect.exponent_base)
            .set_factor(reconnect.factor)
            .set_max_delay(reconnect.max_delay_ms)
            .set_connection_timeout(settings.connect_timeout())
            .set_response_timeout(settings.response_timeout())
    }
}

/// Connection info with auth material and database applied
fn connection_info(descriptor: &ConnectionDescriptor) -> Result<ConnectionInfo, ConnectionError> {
    let mut info = descriptor.url.as_str().into_connection_info()?;

    if let Some(auth) = &descriptor.auth {
        info.redis.password = Some(auth.password.clone());
        if let Some(username) = &auth.username {
            info.redis.username = Some(username.clone());
        }
    }
    if let Some(db) = descriptor.settings.db {
        info.redis.db = db;
    }

    Ok(info)
}

#[async_trait]
impl Transport for RedisTransport {
    type Connection = ConnectionManager;

    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        events: EventSink,
    ) -> Result<Opened<ConnectionManager>, ConnectionError> {
        let client = Self::client(descriptor)?;
        let mut manager =
            ConnectionManager::new_with_config(client, Self::manager_config(descriptor)).await?;
        events.emit(ClientEvent::Connect);

        let pong: String = redis::cmd("PING").query_async(&mut manager).await?;
        debug!(response = %pong, "initial PING succeeded");
        events.emit(ClientEvent::Ready);

        let monitor = tokio::spawn(monitor(
            manager.clone(),
            descriptor.settings.reconnect.clone(),
            events,
        ));

        Ok(Opened::new(manager).with_task(monitor))
    }
}

/// What the monitor should report after a health ping
#[derive(Debug, PartialEq)]
enum Probe {
    Healthy { recovered: bool },
    Degraded { attempt: u32 },
    Fatal,
}

/// Fold one ping outcome into the consecutive-failure counter
fn assess(result: Result<(), &RedisError>, failures: &mut u32, max_attempts: u32) -> Probe {
    match result {
        Ok(()) => {
            let recovered = *failures > 0;
            *failures = 0;
            Probe::Healthy { recovered }
        }
        Err(e) if e.kind() == ErrorKind::AuthenticationFailed => Probe::Fatal,
        Err(_) => {
            *failures += 1;
            if *failures >= max_attempts {
                Probe::Fatal
            } else {
                Probe::Degraded { attempt: *failures }
            }
        }
    }
}

async fn monitor(mut manager: ConnectionManager, config: ReconnectConfig, events: EventSink) {
    let mut interval = tokio::time::interval(config.health_check_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately and the connection was just verified
    interval.tick().await;

    let mut failures = 0;
    loop {
        interval.tick().await;
        if events.is_closed() {
            break;
        }

        let result = redis::cmd("PING").query_async::<String>(&mut manager).await;
        let probe = assess(result.as_ref().map(|_| ()), &mut failures, config.max_attempts);
        trace!(?probe, "health check");

        let delivered = match probe {
            Probe::Healthy { recovered: false } => true,
            Probe::Healthy { recovered: true } => events.emit(ClientEvent::Ready),
            Probe::Degraded { attempt } => events.emit(ClientEvent::Reconnecting {
                attempt,
                reason: error_reason(result.err()),
            }),
            Probe::Fatal => {
                events.emit(ClientEvent::Error(error_reason(result.err())));
                break;
            }
        };

        if !delivered {
            break;
        }
    }
}

fn error_reason(error: Option<RedisError>) -> String {
    error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "health check failed".to_string())
}
