/// The current state of a session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No network activity yet.
    #[default]
    Idle,

    /// Transport handshake in progress.
    Connecting,

    /// Handshake complete; send/receive permitted.
    Connected,

    /// Handshake failed or connection dropped; waiting out the backoff
    /// delay before connecting again.
    Reconnecting,

    /// Close handshake in progress after an explicit close.
    Closing,

    /// Terminal. A closed session never transitions again.
    Closed,
}

impl SessionState {
    /// Whether `next` is a legal successor of this state.
    ///
    /// Any state may transition to `Closing`/`Closed` (explicit close);
    /// `Closed` is terminal.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closing) | (_, Closed) => true,
            (Idle, Connecting) => true,
            (Connecting, Connected) | (Connecting, Reconnecting) => true,
            (Connected, Reconnecting) => true,
            (Reconnecting, Connecting) => true,
            _ => false,
        }
    }

    /// Whether the session has fully terminated.
    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        use SessionState::*;
        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Closing));
        assert!(Closing.can_transition_to(Closed));
    }

    #[test]
    fn test_reconnect_loop() {
        use SessionState::*;
        assert!(Connecting.can_transition_to(Reconnecting));
        assert!(Connected.can_transition_to(Reconnecting));
        assert!(Reconnecting.can_transition_to(Connecting));
        assert!(!Reconnecting.can_transition_to(Connected));
    }

    #[test]
    fn test_closed_is_terminal() {
        use SessionState::*;
        assert!(Closed.is_terminal());
        assert!(!Closed.can_transition_to(Connecting));
        assert!(!Closed.can_transition_to(Closed));
    }

    #[test]
    fn test_close_from_anywhere() {
        use SessionState::*;
        for state in [Idle, Connecting, Connected, Reconnecting, Closing] {
            assert!(state.can_transition_to(Closed), "{state} -> closed");
        }
    }
}
