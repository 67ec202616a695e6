//! # wsession
//!
//! A small WebSocket client session library for Rust.
//!
//! `wsession` wraps one logical WebSocket connection in an explicit
//! lifecycle: connect, send, receive, close, and reconnect-on-failure,
//! with every lifecycle event delivered in order to a caller-supplied
//! observer.
//!
//! ## Features
//!
//! - **Explicit state machine**: `Idle → Connecting → Connected → Closing → Closed`,
//!   with `Reconnecting` between failed attempts
//! - **Reconnect policy**: exponential backoff with cap and jitter,
//!   optional attempt budget
//! - **Ordered events**: `Opened`, `MessageReceived`, `Closed`, `Error`
//!   delivered to one observer, in occurrence order
//! - **Outbound queue**: payloads sent before the handshake completes are
//!   flushed FIFO once connected; undelivered payloads are reported on close
//! - **Per-session TLS policy**: certificate verification is an explicit
//!   per-session flag, never process-global
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsession::{Endpoint, Session, SessionConfig, Event, Observer};
//!
//! struct Printer;
//!
//! impl Observer for Printer {
//!     fn on_event(&mut self, event: Event) {
//!         println!("{event:?}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wsession::WsError> {
//!     let endpoint = Endpoint::parse("wss://example.test/echo")?
//!         .header("Authorization", "Bearer <token>");
//!     let session = Session::connect(endpoint, SessionConfig::default(), Printer)?;
//!     session.send(b"ping".as_ref())?;
//!     session.closed().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core error definitions
//! - [`ws`] - Endpoint, messages, events, backoff, and the session driver

pub mod base;
pub mod ws;

pub use base::error::WsError;
pub use ws::backoff::BackoffPolicy;
pub use ws::endpoint::Endpoint;
pub use ws::event::{Event, Observer};
pub use ws::message::{CloseCode, CloseFrame, Message};
pub use ws::session::{Session, SessionConfig};
pub use ws::state::SessionState;
