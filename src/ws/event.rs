//! Session lifecycle events and the observer they are delivered to.

use crate::base::error::WsError;
use crate::ws::message::CloseCode;
use bytes::Bytes;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A lifecycle event, delivered to the observer in occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Handshake completed; the session is connected.
    Opened,
    /// A data frame arrived. Text frames surface as their UTF-8 bytes.
    MessageReceived { payload: Bytes },
    /// The session terminated. Exactly one per session lifetime.
    Closed {
        code: Option<CloseCode>,
        reason: String,
    },
    /// A non-fatal fault, or the final fault before `Closed`.
    Error { error: WsError },
}

/// Caller-supplied event sink. One observer per session; events arrive
/// in order, from the session's driver task.
pub trait Observer: Send {
    fn on_event(&mut self, event: Event);
}

/// Any `FnMut(Event)` closure works as an observer.
impl<F: FnMut(Event) + Send> Observer for F {
    fn on_event(&mut self, event: Event) {
        self(event);
    }
}

/// Wraps the observer so a panicking callback is isolated and reported
/// as an [`WsError::ObserverFault`] instead of tearing the driver down.
pub(crate) struct EventSink {
    observer: Box<dyn Observer>,
}

impl EventSink {
    pub(crate) fn new(observer: impl Observer + 'static) -> Self {
        Self {
            observer: Box::new(observer),
        }
    }

    /// Deliver one event. A panic in the observer produces a follow-up
    /// `Error { ObserverFault }` delivery; a panic during that follow-up
    /// is only logged.
    pub(crate) fn emit(&mut self, event: Event) {
        if let Err(description) = self.try_emit(event) {
            tracing::warn!("observer panicked: {description}");
            let fault = Event::Error {
                error: WsError::ObserverFault { description },
            };
            if let Err(second) = self.try_emit(fault) {
                tracing::warn!("observer panicked while reporting a fault: {second}");
            }
        }
    }

    fn try_emit(&mut self, event: Event) -> Result<(), String> {
        catch_unwind(AssertUnwindSafe(|| self.observer.on_event(event)))
            .map_err(|payload| panic_description(payload.as_ref()))
    }
}

fn panic_description(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_observer() {
        let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = events.clone();
        let mut sink = EventSink::new(move |event: Event| log.lock().unwrap().push(event));

        sink.emit(Event::Opened);
        sink.emit(Event::MessageReceived {
            payload: Bytes::from_static(b"hi"),
        });

        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Event::Opened);
    }

    #[test]
    fn test_panicking_observer_reports_fault() {
        let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = events.clone();
        let mut first = true;
        let mut sink = EventSink::new(move |event: Event| {
            log.lock().unwrap().push(event.clone());
            if first {
                first = false;
                panic!("boom");
            }
        });

        sink.emit(Event::Opened);

        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Event::Opened);
        assert!(matches!(
            &seen[1],
            Event::Error {
                error: WsError::ObserverFault { description }
            } if description == "boom"
        ));
    }

    #[test]
    fn test_formatted_panic_message_is_kept() {
        let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = events.clone();
        let mut first = true;
        let mut sink = EventSink::new(move |event: Event| {
            log.lock().unwrap().push(event);
            if first {
                first = false;
                // Formatted panics carry a String payload, not a &str.
                panic!("bad payload at offset {}", 42);
            }
        });

        sink.emit(Event::Opened);

        let seen = events.lock().unwrap();
        assert!(matches!(
            &seen[1],
            Event::Error {
                error: WsError::ObserverFault { description }
            } if description == "bad payload at offset 42"
        ));
    }

    #[test]
    fn test_fault_report_panic_is_swallowed() {
        let mut sink = EventSink::new(|_: Event| panic!("always"));
        // Must not propagate either panic.
        sink.emit(Event::Opened);
    }
}
