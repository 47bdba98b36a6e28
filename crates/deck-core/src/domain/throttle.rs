//! Minimum-interval call throttle.
//!
//! A [`Throttle`] admits a call only if the previous *admitted* call is at
//! least `window` old.  Rejected calls are dropped, not queued, and do not
//! move the window.

use std::time::{Duration, Instant};

/// Default minimum spacing between executed actions.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` and records `now` if a call may proceed at `now`.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let admitted = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.window,
            None => true,
        };
        if admitted {
            self.last = Some(now);
        }
        admitted
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_WINDOW)
    }
}
