use thiserror::Error;

/// Errors produced by a session, either returned synchronously from the
/// handle API or delivered to the observer inside an `Event::Error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WsError {
    // Synchronous API errors
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("A connection is already active on this session")]
    AlreadyConnected,
    #[error("Session is closed")]
    SessionClosed,

    // Faults reported through the event stream
    #[error("WebSocket handshake failed: {reason}")]
    HandshakeFailed { reason: String },
    #[error("Transport closed: {reason}")]
    TransportClosed { reason: String },
    #[error("{count} queued payload(s) dropped at session teardown")]
    SendDropped { count: usize },
    #[error("Observer callback panicked: {description}")]
    ObserverFault { description: String },
    #[error("Reconnect budget exhausted after {attempts} attempt(s)")]
    MaxAttemptsExhausted { attempts: u32 },
}

impl WsError {
    /// Whether the reconnect policy may retry after this error.
    ///
    /// Only transport-level failures are retryable; API misuse and
    /// teardown reports are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WsError::HandshakeFailed { .. } | WsError::TransportClosed { .. }
        )
    }

    /// Whether this error terminates the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WsError::MaxAttemptsExhausted { .. } | WsError::SessionClosed
        )
    }
}
