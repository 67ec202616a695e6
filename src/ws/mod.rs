//! WebSocket session support.
//!
//! Wraps one logical connection in an explicit lifecycle with
//! reconnect-on-failure, built on tokio-tungstenite.
//!
//! # Example
//! ```ignore
//! use wsession::{Endpoint, Session, SessionConfig};
//!
//! let endpoint = Endpoint::parse("wss://echo.websocket.org")?;
//! let session = Session::connect(endpoint, SessionConfig::default(), observer)?;
//! session.send(b"hello".as_ref())?;
//! ```

pub mod backoff;
pub mod endpoint;
pub mod event;
pub mod message;
pub mod session;
pub mod state;

pub use backoff::BackoffPolicy;
pub use endpoint::Endpoint;
pub use event::{Event, Observer};
pub use message::{CloseCode, CloseFrame, Message};
pub use session::{Session, SessionConfig};
pub use state::SessionState;
