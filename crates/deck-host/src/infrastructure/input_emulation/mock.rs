//! Mock platform input emulator for tests.
//!
//! # Why a mock emulator?
//!
//! The real input emulators (`WindowsInputEmulator`, `LinuxXTestEmulator`)
//! make OS API calls that:
//!
//! - Require a desktop session to run.
//! - Actually press keys on the test machine.
//! - Cannot be observed directly from Rust test code.
//!
//! The `MockInputEmulator` replaces all OS calls with in-memory recording.
//! Every event is pushed into a `Mutex<Vec<...>>` together with the instant it
//! was emitted, so tests can check both the order and the key hold time.
//!
//! # Usage in tests
//!
//! ```ignore
//! let emulator = Arc::new(MockInputEmulator::new());
//! let executor = ActionExecutor::new(emulator.clone());
//!
//! executor.execute(&ActionDescriptor::key_press("f16")?)?;
//!
//! assert_eq!(
//!     emulator.events(),
//!     vec![EmulatedEvent::VirtualKey { vk: 0x7F, pressed: true },
//!          EmulatedEvent::VirtualKey { vk: 0x7F, pressed: false }],
//! );
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail` before calling a method to simulate OS failures, or
//! build the mock with `failing_times(n)` for a failure that clears itself.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use deck_core::Key;

use crate::application::execute_action::{EmulationError, PlatformInputEmulator};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatedEvent {
    Key { key: Key, pressed: bool },
    VirtualKey { vk: u8, pressed: bool },
    Text(String),
}

/// A mock emulator that records all calls without performing OS API calls.
#[derive(Debug, Default)]
pub struct MockInputEmulator {
    /// Every call in order, with the instant it happened.
    pub log: Mutex<Vec<(EmulatedEvent, Instant)>>,
    /// When set, every method returns `EmulationError::Platform` and records
    /// nothing.
    pub should_fail: AtomicBool,
    /// Calls left to fail before the mock starts recording again.
    pub failures_left: AtomicUsize,
}

impl MockInputEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails.
    pub fn failing() -> Self {
        let mock = Self::default();
        mock.should_fail.store(true, Ordering::SeqCst);
        mock
    }

    /// A mock whose next `calls` calls fail, after which it records normally.
    pub fn failing_times(calls: usize) -> Self {
        let mock = Self::default();
        mock.failures_left.store(calls, Ordering::SeqCst);
        mock
    }

    /// Recorded events without timestamps.
    pub fn events(&self) -> Vec<EmulatedEvent> {
        self.lock().iter().map(|(event, _)| event.clone()).collect()
    }

    /// Recorded events with timestamps.
    pub fn timed_events(&self) -> Vec<(EmulatedEvent, Instant)> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(EmulatedEvent, Instant)>> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: EmulatedEvent) -> Result<(), EmulationError> {
        let scripted_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if scripted_failure || self.should_fail.load(Ordering::SeqCst) {
            return Err(EmulationError::Platform("mock failure".into()));
        }
        self.lock().push((event, Instant::now()));
        Ok(())
    }
}

impl PlatformInputEmulator for MockInputEmulator {
    fn emit_key(&self, key: Key, pressed: bool) -> Result<(), EmulationError> {
        self.record(EmulatedEvent::Key { key, pressed })
    }

    fn emit_virtual_key(&self, vk: u8, pressed: bool) -> Result<(), EmulationError> {
        self.record(EmulatedEvent::VirtualKey { vk, pressed })
    }

    fn emit_text(&self, text: &str) -> Result<(), EmulationError> {
        self.record(EmulatedEvent::Text(text.to_string()))
    }
}
