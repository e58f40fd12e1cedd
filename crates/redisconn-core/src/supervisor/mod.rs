//! Connection supervision
//!
//! A transport opens the connection and reports raw [`ClientEvent`]s. A single
//! supervisor task folds them into a [`Lifecycle`] published through a
//! `watch` channel, so every observer sees the same state. Callers only get a
//! [`ClientHandle`] once the client has been ready at least once.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::descriptor::ConnectionDescriptor;

pub mod lifecycle;
pub mod transport;

pub use lifecycle::{ClientEvent, ClientState, Lifecycle};
pub use transport::RedisTransport;

/// Errors raised while opening or supervising a connection
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("connection failed: {0}")]
    Failed(String),

    #[error("client did not become ready within {0:?}")]
    ReadyTimeout(Duration),

    #[error("connection supervisor stopped before the client became ready")]
    Closed,
}

impl ConnectionError {
    /// Whether a fresh attempt could succeed without configuration changes
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectionError::Redis(e) => {
                e.is_io_error() || e.is_timeout() || e.is_connection_dropped()
            }
            ConnectionError::ReadyTimeout(_) | ConnectionError::Closed => true,
            ConnectionError::Failed(_) => false,
        }
    }
}

/// Sending half for lifecycle events
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self { tx }
    }

    /// Report an event; `false` once nobody is supervising any more
    pub fn emit(&self, event: ClientEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Background task aborted when dropped
#[derive(Debug)]
pub struct AbortOnDrop(JoinHandle<()>);

impl AbortOnDrop {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A connection returned by a transport plus the tasks that keep it observed
pub struct Opened<C> {
    pub connection: C,
    tasks: Vec<AbortOnDrop>,
}

impl<C> Opened<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            tasks: Vec::new(),
        }
    }

    /// Tie a background task's lifetime to the returned handle
    pub fn with_task(mut self, handle: JoinHandle<()>) -> Self {
        self.tasks.push(AbortOnDrop::new(handle));
        self
    }
}

/// Seam between supervision and the underlying client
#[async_trait]
pub trait Transport: Send + Sync {
    type Connection: Send + 'static;

    /// Open a connection for `descriptor`, reporting lifecycle events to `events`
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        events: EventSink,
    ) -> Result<Opened<Self::Connection>, ConnectionError>;
}

/// Live connection that has been ready at least once
pub struct ClientHandle<C> {
    connection: C,
    key_prefix: String,
    state: watch::Receiver<Lifecycle>,
    _tasks: Vec<AbortOnDrop>,
}

impl<C> std::fmt::Debug for ClientHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("key_prefix", &self.key_prefix)
            .field("lifecycle", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<C> ClientHandle<C> {
    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Current state
    pub fn state(&self) -> ClientState {
        self.state.borrow().state
    }

    /// Full lifecycle snapshot
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ClientState::Ready
    }

    /// Observe lifecycle changes
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.state.clone()
    }

    /// One-shot readiness notification
    pub fn ready_signal(&self) -> ReadySignal {
        ReadySignal {
            state: self.state.clone(),
        }
    }
}

/// Resolves once the client has reached `Ready`
#[derive(Debug)]
pub struct ReadySignal {
    state: watch::Receiver<Lifecycle>,
}

impl ReadySignal {
    pub fn is_fired(&self) -> bool {
        self.state.borrow().ever_ready
    }

    /// Wait for the first `Ready`, or fail if the client fails first
    pub async fn wait(mut self) -> Result<(), ConnectionError> {
        let lifecycle = self
            .state
            .wait_for(|l| l.ever_ready || l.is_failed())
            .await
            .map_err(|_| ConnectionError::Closed)?
            .clone();

        if lifecycle.ever_ready {
            Ok(())
        } else {
            Err(failure(&lifecycle))
        }
    }
}

/// Open a supervised connection and wait until it is ready
///
/// The wait covers the transport's own dial and is bounded by
/// `readyTimeoutMs`. On any failure the background tasks are stopped and no
/// handle is returned.
pub async fn connect<T: Transport>(
    transport: &T,
    descriptor: &ConnectionDescriptor,
) -> Result<ClientHandle<T::Connection>, ConnectionError> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(Lifecycle::new());
    let supervisor = AbortOnDrop::new(tokio::spawn(supervise(event_rx, state_tx)));

    let ready_timeout = descriptor.settings.ready_timeout();
    debug!(
        url = %descriptor.redacted_url(),
        timeout_ms = ready_timeout.as_millis() as u64,
        "opening redis connection"
    );

    let mut waiter = state_rx.clone();
    let outcome = tokio::time::timeout(ready_timeout, async {
        let opened = transport.open(descriptor, EventSink::new(event_tx)).await?;
        let lifecycle = waiter
            .wait_for(|l| l.ever_ready || l.is_failed())
            .await
            .map_err(|_| ConnectionError::Closed)?
            .clone();
        Ok::<_, ConnectionError>((opened, lifecycle))
    })
    .await;

    let (opened, lifecycle) = match outcome {
        Ok(result) => result?,
        Err(_) => return Err(ConnectionError::ReadyTimeout(ready_timeout)),
    };

    // A burst of events can fail the client before the waiter observes Ready
    if lifecycle.is_failed() || !lifecycle.ever_ready {
        return Err(failure(&lifecycle));
    }

    let mut tasks = opened.tasks;
    tasks.push(supervisor);

    Ok(ClientHandle {
        connection: opened.connection,
        key_prefix: descriptor.key_prefix().to_string(),
        state: state_rx,
        _tasks: tasks,
    })
}

fn failure(lifecycle: &Lifecycle) -> ConnectionError {
    ConnectionError::Failed(
        lifecycle
            .last_error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string()),
    )
}

/// Single writer of the published lifecycle
async fn supervise(mut events: mpsc::UnboundedReceiver<ClientEvent>, state: watch::Sender<Lifecycle>) {
    while let Some(event) = events.recv().await {
        if state.borrow().is_failed() {
            debug!(?event, "ignoring lifecycle event after failure");
            continue;
        }

        match &event {
            ClientEvent::Connect => debug!("redis connection established"),
            ClientEvent::Ready => info!("redis client ready"),
            ClientEvent::Reconnecting { attempt, reason } => {
                warn!(attempt, reason = %reason, "redis client reconnecting")
            }
            ClientEvent::Error(message) => error!(error = %message, "redis client failed"),
        }

        state.send_if_modified(|lifecycle| lifecycle.apply(&event));

        if state.borrow().is_failed() {
            break;
        }
    }
    debug!("lifecycle supervisor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_supervise_publishes_transitions() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, mut state_rx) = watch::channel(Lifecycle::new());
        let task = tokio::spawn(supervise(rx, state_tx));

        let sink = EventSink::new(tx);
        assert!(sink.emit(ClientEvent::Connect));
        assert!(sink.emit(ClientEvent::Ready));

        let lifecycle = state_rx.wait_for(|l| l.ever_ready).await.unwrap().clone();
        assert_eq!(lifecycle.state, ClientState::Ready);

        sink.emit(ClientEvent::Error("boom".into()));
        task.await.unwrap();

        assert!(state_rx.borrow().is_failed());
        assert!(!sink.emit(ClientEvent::Ready));
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_supervise_stops_when_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(Lifecycle::new());
        let task = tokio::spawn(supervise(rx, state_tx));

        drop(tx);
        task.await.unwrap();
        assert_eq!(state_rx.borrow().state, ClientState::Connecting);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ConnectionError::ReadyTimeout(Duration::from_secs(1)).is_retryable());
        assert!(ConnectionError::Closed.is_retryable());
        assert!(!ConnectionError::Failed("WRONGPASS".into()).is_retryable());
    }
}
