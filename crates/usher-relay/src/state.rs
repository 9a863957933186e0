//! Broker connection state tracking.

use std::time::Instant;

use parking_lot::RwLock;

/// Connection lifecycle of the invalidation bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Tracks the bus connection for health reporting and reconnect decisions.
#[derive(Debug)]
pub struct BusState {
    /// The current connection phase.
    state: RwLock<ConnectionState>,
    /// When the current connection was established.
    connected_at: RwLock<Option<Instant>>,
    /// The last error message, if any.
    last_error: RwLock<Option<String>>,
    /// Number of consecutive connection failures.
    failure_count: RwLock<u32>,
}

impl BusState {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            connected_at: RwLock::new(None),
            last_error: RwLock::new(None),
            failure_count: RwLock::new(0),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Marks the start of a connection attempt.
    pub fn record_connecting(&self) {
        *self.state.write() = ConnectionState::Connecting;
    }

    /// Records an established connection.
    pub fn record_connected(&self) {
        let mut state = self.state.write();
        let mut connected_at = self.connected_at.write();
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        *state = ConnectionState::Connected;
        *connected_at = Some(Instant::now());
        *last_error = None;
        *failure_count = 0;
    }

    /// Records a failed connection attempt or a lost connection.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut state = self.state.write();
        let mut connected_at = self.connected_at.write();
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        *state = ConnectionState::Disconnected;
        *connected_at = None;
        *last_error = Some(error.into());
        *failure_count += 1;
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub fn failure_count(&self) -> u32 {
        *self.failure_count.read()
    }

    /// Duration the current connection has been up.
    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.connected_at.read().map(|t| t.elapsed())
    }
}

impl Default for BusState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = BusState::new();
        assert_eq!(state.state(), ConnectionState::Disconnected);
        assert!(!state.is_connected());
        assert!(state.uptime().is_none());
    }

    #[test]
    fn test_record_connected() {
        let state = BusState::new();
        state.record_connecting();
        assert_eq!(state.state(), ConnectionState::Connecting);

        state.record_connected();
        assert!(state.is_connected());
        assert!(state.uptime().is_some());
        assert_eq!(state.failure_count(), 0);
    }

    #[test]
    fn test_record_failure() {
        let state = BusState::new();
        state.record_failure("connection refused");
        state.record_failure("timeout");

        assert_eq!(state.failure_count(), 2);
        assert_eq!(state.last_error(), Some("timeout".to_string()));
        assert!(!state.is_connected());
    }

    #[test]
    fn test_reconnect_clears_failures() {
        let state = BusState::new();
        state.record_failure("error 1");
        state.record_failure("error 2");

        state.record_connected();
        assert_eq!(state.failure_count(), 0);
        assert!(state.last_error().is_none());
    }
}
