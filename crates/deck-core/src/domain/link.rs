//! Connection state and reconnection backoff for the device link.

use std::fmt;
use std::time::Duration;

/// Default wait before the first reconnection attempt.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);
/// Default upper bound on the reconnection wait.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Growth factor applied after each failed connection attempt.
pub const BACKOFF_FACTOR: f64 = 1.5;

/// State of the link to the deck.
///
/// `Connecting` is the part of "disconnected" where a backoff wait is in
/// progress after a failed discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Status word shown to the user.
    pub fn status(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "waiting",
            ConnectionState::Connected => "connected",
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status())
    }
}

/// Reconnection delay: grows by [`BACKOFF_FACTOR`] per failure, capped at
/// `max`, and drops back to `initial` on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    current: Duration,
    initial: Duration,
    max: Duration,
}

impl Backoff {
    /// Creates a backoff starting at `initial`.  `max` is raised to `initial`
    /// if it is smaller.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial,
            initial,
            max: max.max(initial),
        }
    }

    /// The delay to wait before the next attempt.
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Records a failed attempt: `current = min(current * 1.5, max)`.
    /// Returns the new delay.
    pub fn advance(&mut self) -> Duration {
        self.current = self.current.mul_f64(BACKOFF_FACTOR).min(self.max);
        self.current
    }

    /// Records a success: the next failure waits `initial` again.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF)
    }
}
