//! ExecuteActionUseCase: turns an [`ActionDescriptor`] into OS input events.
//!
//! This use case sits at the application layer and delegates to a
//! [`PlatformInputEmulator`] trait object for OS-level event injection.
//! The platform-specific implementations are in the infrastructure layer.
//!
//! # Key taps and F13–F24
//!
//! A key tap is press, hold for [`DEFAULT_KEY_HOLD`], release.  Function keys
//! 13–24 are injected through the raw virtual-key path
//! ([`PlatformInputEmulator::emit_virtual_key`]) because the symbolic key
//! tables of most input layers stop at F12.
//!
//! # Paired press/release
//!
//! Every key this executor presses is released again, in reverse order, even
//! when a later press in the same chord fails.  A failed chord must never
//! leave Ctrl or Shift held down.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use deck_core::keymap::windows_vk::function_key_vk;
use deck_core::{ActionDescriptor, Key};
use thiserror::Error;
use tracing::{debug, error};

/// How long a tapped key stays down.
pub const DEFAULT_KEY_HOLD: Duration = Duration::from_millis(50);

/// Lowest function key that goes through the raw virtual-key path.
const RAW_FUNCTION_KEY_START: u8 = 13;

/// Error type for input emulation operations.
#[derive(Debug, Error)]
pub enum EmulationError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("key has no code on this platform: {0}")]
    UnmappedKey(Key),
    #[error("emulator not initialized")]
    NotInitialized,
}

/// Returned when an action could not be performed.
#[derive(Debug, Error)]
pub enum ActionExecutionError {
    #[error("failed to perform {action}: {source}")]
    Injection {
        /// Legacy string form of the action, for the UI notice.
        action: String,
        #[source]
        source: EmulationError,
    },
}

/// Platform-agnostic input emulation trait.
///
/// Each supported OS provides an implementation in the infrastructure layer.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformInputEmulator: Send + Sync {
    /// Presses (`pressed = true`) or releases a catalogued key.
    fn emit_key(&self, key: Key, pressed: bool) -> Result<(), EmulationError>;

    /// Presses or releases a key by raw Windows virtual-key code.
    fn emit_virtual_key(&self, vk: u8, pressed: bool) -> Result<(), EmulationError>;

    /// Types a literal character sequence.
    fn emit_text(&self, text: &str) -> Result<(), EmulationError>;
}

/// The Execute Action use case.
pub struct ActionExecutor {
    emulator: Arc<dyn PlatformInputEmulator>,
    key_hold: Duration,
}

impl ActionExecutor {
    /// Creates a new executor with the given platform emulator.
    pub fn new(emulator: Arc<dyn PlatformInputEmulator>) -> Self {
        Self {
            emulator,
            key_hold: DEFAULT_KEY_HOLD,
        }
    }

    /// Overrides how long tapped keys are held.
    pub fn with_key_hold(mut self, key_hold: Duration) -> Self {
        self.key_hold = key_hold;
        self
    }

    pub fn key_hold(&self) -> Duration {
        self.key_hold
    }

    /// Performs `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionExecutionError::Injection`] if the OS rejected an
    /// event.  Keys pressed before the failure have been released.
    pub fn execute(&self, descriptor: &ActionDescriptor) -> Result<(), ActionExecutionError> {
        debug!(action = %descriptor, "executing action");
        let result = match descriptor {
            ActionDescriptor::Text(text) => self.emulator.emit_text(text),
            ActionDescriptor::KeyPress(key) => self.tap(*key),
            ActionDescriptor::Hotkey(keys) => self.chord(keys),
            ActionDescriptor::Volume(direction) => self.tap(direction.key()),
            ActionDescriptor::Media(command) => self.tap(command.key()),
        };
        result.map_err(|source| ActionExecutionError::Injection {
            action: descriptor.to_string(),
            source,
        })
    }

    /// Press, hold, release.
    fn tap(&self, key: Key) -> Result<(), EmulationError> {
        self.set_key(key, true)?;
        thread::sleep(self.key_hold);
        self.set_key(key, false)
    }

    /// Presses every key in order, then releases them in reverse order.
    fn chord(&self, keys: &[Key]) -> Result<(), EmulationError> {
        let mut pressed = Vec::with_capacity(keys.len());
        let mut first_error = None;

        for &key in keys {
            match self.set_key(key, true) {
                Ok(()) => pressed.push(key),
                Err(e) => {
                    first_error = Some(e);
                    break;
                }
            }
        }

        if first_error.is_none() {
            thread::sleep(self.key_hold);
        }

        for &key in pressed.iter().rev() {
            if let Err(e) = self.set_key(key, false) {
                error!(%key, "failed to release key: {e}");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn set_key(&self, key: Key, pressed: bool) -> Result<(), EmulationError> {
        match raw_function_vk(key) {
            Some(vk) => self.emulator.emit_virtual_key(vk, pressed),
            None => self.emulator.emit_key(key, pressed),
        }
    }
}

/// Virtual-key code for F13–F24, `None` for every other key.
fn raw_function_vk(key: Key) -> Option<u8> {
    key.function_number()
        .filter(|&n| n >= RAW_FUNCTION_KEY_START)
        .and_then(function_key_vk)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
