//! WebSocket message types.

use bytes::Bytes;
use tokio_tungstenite::tungstenite;

/// WebSocket message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Text message (UTF-8)
    Text(String),
    /// Binary message
    Binary(Bytes),
    /// Ping frame
    Ping(Vec<u8>),
    /// Pong frame
    Pong(Vec<u8>),
    /// Close frame with optional code and reason
    Close(Option<CloseFrame>),
}

impl Message {
    /// Check if this is a data frame (text or binary).
    pub fn is_data(&self) -> bool {
        matches!(self, Message::Text(_) | Message::Binary(_))
    }

    /// Check if this is a close message.
    pub fn is_close(&self) -> bool {
        matches!(self, Message::Close(_))
    }

    /// Payload bytes of a data frame (text as UTF-8, binary as-is).
    pub fn into_payload(self) -> Option<Bytes> {
        match self {
            Message::Text(s) => Some(Bytes::from(s.into_bytes())),
            Message::Binary(b) => Some(b),
            _ => None,
        }
    }
}

/// Close frame data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// Close code (RFC 6455)
    pub code: CloseCode,
    /// Close reason (optional UTF-8 string)
    pub reason: String,
}

impl CloseFrame {
    /// Create a new close frame.
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// WebSocket close codes (RFC 6455).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure
    pub const NORMAL: Self = Self(1000);
    /// Server going down
    pub const GOING_AWAY: Self = Self(1001);
    /// Protocol error
    pub const PROTOCOL_ERROR: Self = Self(1002);
    /// Unsupported data type
    pub const UNSUPPORTED: Self = Self(1003);
    /// No status received
    pub const NO_STATUS: Self = Self(1005);
    /// Abnormal closure
    pub const ABNORMAL: Self = Self(1006);
    /// Internal server error
    pub const INTERNAL_ERROR: Self = Self(1011);
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl From<Message> for tungstenite::Message {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Text(s) => tungstenite::Message::Text(s),
            Message::Binary(b) => tungstenite::Message::Binary(b.to_vec()),
            Message::Ping(d) => tungstenite::Message::Ping(d),
            Message::Pong(d) => tungstenite::Message::Pong(d),
            Message::Close(frame) => {
                let frame = frame.map(|f| tungstenite::protocol::CloseFrame {
                    code: tungstenite::protocol::frame::coding::CloseCode::from(f.code.0),
                    reason: f.reason.into(),
                });
                tungstenite::Message::Close(frame)
            }
        }
    }
}

impl From<tungstenite::Message> for Message {
    fn from(msg: tungstenite::Message) -> Self {
        match msg {
            tungstenite::Message::Text(s) => Message::Text(s),
            tungstenite::Message::Binary(b) => Message::Binary(Bytes::from(b)),
            tungstenite::Message::Ping(d) => Message::Ping(d),
            tungstenite::Message::Pong(d) => Message::Pong(d),
            tungstenite::Message::Close(frame) => {
                let frame = frame.map(|f| CloseFrame {
                    code: CloseCode(f.code.into()),
                    reason: f.reason.to_string(),
                });
                Message::Close(frame)
            }
            // Raw frames never surface from a read stream
            tungstenite::Message::Frame(_) => Message::Binary(Bytes::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_frames() {
        let text = Message::Text("hello".into());
        assert!(text.is_data());
        assert_eq!(text.into_payload(), Some(Bytes::from_static(b"hello")));

        let binary = Message::Binary(Bytes::from_static(b"data"));
        assert!(binary.is_data());
        assert_eq!(binary.into_payload(), Some(Bytes::from_static(b"data")));

        let ping = Message::Ping(vec![1]);
        assert!(!ping.is_data());
        assert_eq!(ping.into_payload(), None);
    }

    #[test]
    fn test_close_codes() {
        assert_eq!(CloseCode::NORMAL.0, 1000);
        assert_eq!(CloseCode::GOING_AWAY.0, 1001);

        let code: u16 = CloseCode::NORMAL.into();
        assert_eq!(code, 1000);
    }

    #[test]
    fn test_close_frame() {
        let frame = CloseFrame::new(CloseCode::NORMAL, "bye");
        assert_eq!(frame.code, CloseCode::NORMAL);
        assert_eq!(frame.reason, "bye");
    }

    #[test]
    fn test_tungstenite_round_trip() {
        let msg = Message::Text("hello".into());
        let tung: tungstenite::Message = msg.clone().into();
        assert_eq!(Message::from(tung), msg);

        let msg = Message::Close(Some(CloseFrame::new(CloseCode::NORMAL, "done")));
        let tung: tungstenite::Message = msg.clone().into();
        assert_eq!(Message::from(tung), msg);
    }
}
