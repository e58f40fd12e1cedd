//! Client lifecycle state machine
//!
//! Pure transition logic, kept free of I/O so it can be tested directly.

use serde::Serialize;
use std::fmt;

/// Lifecycle state of a supervised client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientState {
    Connecting,
    Connected,
    Ready,
    Reconnecting,
    Failed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Connecting => "connecting",
            ClientState::Connected => "connected",
            ClientState::Ready => "ready",
            ClientState::Reconnecting => "reconnecting",
            ClientState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Raw lifecycle event reported by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Socket established
    Connect,
    /// Client can serve commands
    Ready,
    /// Connection lost, the client is retrying
    Reconnecting { attempt: u32, reason: String },
    /// Unrecoverable failure
    Error(String),
}

/// Current lifecycle snapshot published by the supervisor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lifecycle {
    pub state: ClientState,
    /// Whether `Ready` has been reached at least once
    pub ever_ready: bool,
    pub reconnect_attempt: u32,
    pub last_error: Option<String>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: ClientState::Connecting,
            ever_ready: false,
            reconnect_attempt: 0,
            last_error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == ClientState::Failed
    }

    pub fn is_ready(&self) -> bool {
        self.state == ClientState::Ready
    }

    /// Apply one event and report whether anything changed
    ///
    /// `Failed` is terminal: every later event is ignored.
    pub fn apply(&mut self, event: &ClientEvent) -> bool {
        if self.is_failed() {
            return false;
        }

        let before = self.clone();
        match event {
            ClientEvent::Connect => {
                self.state = ClientState::Connected;
            }
            ClientEvent::Ready => {
                self.state = ClientState::Ready;
                self.ever_ready = true;
                self.reconnect_attempt = 0;
            }
            ClientEvent::Reconnecting { attempt, reason } => {
                self.state = ClientState::Reconnecting;
                self.reconnect_attempt = *attempt;
                self.last_error = Some(reason.clone());
            }
            ClientEvent::Error(message) => {
                self.state = ClientState::Failed;
                self.last_error = Some(message.clone());
            }
        }

        *self != before
    }
}
