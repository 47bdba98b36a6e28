//! CaptureHotkeyUseCase: records a key chord from live keyboard input.
//!
//! # State machine
//!
//! ```text
//!            start()                  key-up empties held set
//!   Idle ─────────────► Recording ─────────────────────────────► Idle
//!                           │                                     ▲
//!                           └──────────── stop() ─────────────────┘
//! ```
//!
//! While recording, the keyboard hook is held exclusively: every key edge is
//! delivered to the recorder and suppressed from the rest of the system.
//! Each key-down adds the (normalised) key name to the held set and
//! re-renders the canonical combination; each key-up removes it.  When the
//! last held key is released, the last rendered combination is the result.
//!
//! # Guaranteed release
//!
//! Every path out of `Recording` releases the hook: auto-stop, manual stop,
//! a failed acquisition, and dropping the recorder.  The state is set back
//! to `Idle` before the release is attempted, so a failing release can never
//! leave the recorder believing it still owns the hook.

use std::collections::BTreeSet;
use std::sync::Arc;

use deck_core::domain::chord::{canonical_combination, normalize_key_name};
use deck_core::SlotId;
use thiserror::Error;
use tracing::{debug, error, info};

/// Shown in the live display before the first key goes down.
pub const CAPTURE_PLACEHOLDER: &str = "press a key combination...";

/// Error type for hotkey capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("a hotkey capture is already in progress")]
    AlreadyRecording,
    #[error("no hotkey capture is in progress")]
    NotRecording,
    #[error("failed to acquire keyboard hook: {0}")]
    HookAcquire(String),
    #[error("failed to release keyboard hook: {0}")]
    HookRelease(String),
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Direction of a key edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// One raw key-down or key-up reported by the keyboard hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEdge {
    /// Key name as reported by the hook (e.g. `"right ctrl"`, `"a"`).
    pub name: String,
    pub direction: KeyDirection,
}

impl KeyEdge {
    pub fn down(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: KeyDirection::Down,
        }
    }

    pub fn up(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: KeyDirection::Up,
        }
    }
}

/// Receives key edges from the hook thread.  Must not block.
pub type EdgeSink = Box<dyn Fn(KeyEdge) + Send + Sync>;

/// Global keyboard interception.
///
/// Normally the hook passes every key through.  While held exclusively it
/// forwards every edge to the sink and suppresses it.
pub trait KeyboardHook: Send + Sync {
    /// Takes exclusive ownership of keyboard input.
    fn acquire_exclusive(&self, sink: EdgeSink) -> Result<(), CaptureError>;

    /// Restores normal keyboard input.  Calling this when not exclusive is a
    /// no-op.
    fn release_exclusive(&self) -> Result<(), CaptureError>;

    fn is_exclusive(&self) -> bool;
}

/// The outcome of a finished capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedHotkey {
    /// The slot the capture was started for.
    pub slot: SlotId,
    /// Canonical combination, e.g. `"ctrl+shift+a"`.  Empty if no key was
    /// pressed before a manual stop.
    pub combination: String,
}

/// What a key edge did to the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureUpdate {
    /// The live display should now show this combination.
    DisplayChanged(String),
    /// The last held key was released; recording is over.
    Finished(CapturedHotkey),
    /// Nothing changed.
    Ignored,
}

#[derive(Debug)]
struct CaptureSession {
    slot: SlotId,
    held: BTreeSet<String>,
    combination: String,
}

#[derive(Debug)]
enum CaptureState {
    Idle,
    Recording(CaptureSession),
}

/// The Hotkey Capture use case.
pub struct HotkeyCapture {
    hook: Arc<dyn KeyboardHook>,
    state: CaptureState,
}

impl HotkeyCapture {
    pub fn new(hook: Arc<dyn KeyboardHook>) -> Self {
        Self {
            hook,
            state: CaptureState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, CaptureState::Recording(_))
    }

    /// The slot being recorded for, if any.
    pub fn target(&self) -> Option<SlotId> {
        match &self.state {
            CaptureState::Recording(session) => Some(session.slot),
            CaptureState::Idle => None,
        }
    }

    /// Idle → Recording.  Returns the placeholder for the live display.
    ///
    /// # Errors
    ///
    /// [`CaptureError::AlreadyRecording`] if a session is active, or the
    /// hook's acquisition error.  A failed acquisition leaves the hook
    /// released.
    pub fn start(&mut self, slot: SlotId, sink: EdgeSink) -> Result<&'static str, CaptureError> {
        if self.is_recording() {
            return Err(CaptureError::AlreadyRecording);
        }

        if let Err(e) = self.hook.acquire_exclusive(sink) {
            if let Err(release) = self.hook.release_exclusive() {
                error!("keyboard hook release after failed acquire also failed: {release}");
            }
            return Err(e);
        }

        info!(%slot, "hotkey capture started");
        self.state = CaptureState::Recording(CaptureSession {
            slot,
            held: BTreeSet::new(),
            combination: String::new(),
        });
        Ok(CAPTURE_PLACEHOLDER)
    }

    /// Feeds one key edge into the recorder.
    ///
    /// Edges that arrive while idle (stragglers from the hook thread after a
    /// stop) are ignored.
    ///
    /// # Errors
    ///
    /// Only when an auto-stop fails to release the hook; see [`stop`](Self::stop).
    pub fn handle_edge(&mut self, edge: &KeyEdge) -> Result<CaptureUpdate, CaptureError> {
        let CaptureState::Recording(session) = &mut self.state else {
            return Ok(CaptureUpdate::Ignored);
        };
        let name = normalize_key_name(&edge.name);

        match edge.direction {
            KeyDirection::Down => {
                if !session.held.insert(name) {
                    return Ok(CaptureUpdate::Ignored);
                }
                session.combination = canonical_combination(&session.held);
                debug!(combination = %session.combination, "capture display changed");
                Ok(CaptureUpdate::DisplayChanged(session.combination.clone()))
            }
            KeyDirection::Up => {
                if !session.held.remove(&name) {
                    // A key that went down before recording started.
                    return Ok(CaptureUpdate::Ignored);
                }
                if !session.held.is_empty() {
                    return Ok(CaptureUpdate::Ignored);
                }
                info!("all keys released; hotkey capture finished");
                self.finish().map(CaptureUpdate::Finished)
            }
        }
    }

    /// Recording → Idle, regardless of held keys.  Returns whatever
    /// combination was last displayed.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NotRecording`] when idle, or
    /// [`CaptureError::HookRelease`] if normal input could not be restored.
    /// The recorder is idle either way.
    pub fn stop(&mut self) -> Result<CapturedHotkey, CaptureError> {
        if !self.is_recording() {
            return Err(CaptureError::NotRecording);
        }
        info!("hotkey capture stopped");
        self.finish()
    }

    fn finish(&mut self) -> Result<CapturedHotkey, CaptureError> {
        let state = std::mem::replace(&mut self.state, CaptureState::Idle);
        let CaptureState::Recording(session) = state else {
            return Err(CaptureError::NotRecording);
        };

        let captured = CapturedHotkey {
            slot: session.slot,
            combination: session.combination,
        };
        match self.hook.release_exclusive() {
            Ok(()) => Ok(captured),
            Err(e) => {
                error!(combination = %captured.combination, "failed to release keyboard hook: {e}");
                Err(e)
            }
        }
    }
}

impl Drop for HotkeyCapture {
    fn drop(&mut self) {
        if self.is_recording() {
            self.state = CaptureState::Idle;
            if let Err(e) = self.hook.release_exclusive() {
                error!("failed to release keyboard hook on drop: {e}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::keyboard_hook::mock::MockKeyboardHook;

    fn noop_sink() -> EdgeSink {
        Box::new(|_| {})
    }

    fn recording(hook: &Arc<MockKeyboardHook>) -> HotkeyCapture {
        let mut capture = HotkeyCapture::new(Arc::clone(hook) as Arc<dyn KeyboardHook>);
        capture.start(SlotId::A, noop_sink()).expect("start");
        capture
    }

    #[test]
    fn test_start_acquires_hook_and_returns_placeholder() {
        // Arrange
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = HotkeyCapture::new(hook.clone());

        // Act
        let display = capture.start(SlotId::B, noop_sink()).unwrap();

        // Assert
        assert_eq!(display, CAPTURE_PLACEHOLDER);
        assert!(hook.is_exclusive());
        assert_eq!(capture.target(), Some(SlotId::B));
    }

    #[test]
    fn test_second_start_is_rejected() {
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = recording(&hook);

        let result = capture.start(SlotId::C, noop_sink());

        assert!(matches!(result, Err(CaptureError::AlreadyRecording)));
        assert_eq!(capture.target(), Some(SlotId::A));
    }

    #[test]
    fn test_key_downs_render_canonical_order() {
        // Arrange
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = recording(&hook);

        // Act
        let updates: Vec<_> = ["a", "shift", "right ctrl"]
            .into_iter()
            .map(|k| capture.handle_edge(&KeyEdge::down(k)).unwrap())
            .collect();

        // Assert
        assert_eq!(
            updates,
            vec![
                CaptureUpdate::DisplayChanged("a".into()),
                CaptureUpdate::DisplayChanged("shift+a".into()),
                CaptureUpdate::DisplayChanged("ctrl+shift+a".into()),
            ]
        );
    }

    #[test]
    fn test_auto_repeat_key_down_is_ignored() {
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = recording(&hook);
        capture.handle_edge(&KeyEdge::down("ctrl")).unwrap();

        let repeat = capture.handle_edge(&KeyEdge::down("ctrl")).unwrap();

        assert_eq!(repeat, CaptureUpdate::Ignored);
    }

    #[test]
    fn test_releasing_last_key_finishes_and_releases_hook() {
        // Arrange
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = recording(&hook);
        for key in ["ctrl", "shift", "a"] {
            capture.handle_edge(&KeyEdge::down(key)).unwrap();
        }

        // Act
        let mut last = CaptureUpdate::Ignored;
        for key in ["a", "shift", "ctrl"] {
            last = capture.handle_edge(&KeyEdge::up(key)).unwrap();
        }

        // Assert
        assert_eq!(
            last,
            CaptureUpdate::Finished(CapturedHotkey {
                slot: SlotId::A,
                combination: "ctrl+shift+a".into(),
            })
        );
        assert!(!capture.is_recording());
        assert!(!hook.is_exclusive());
    }

    #[test]
    fn test_key_up_for_key_held_before_start_is_ignored() {
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = recording(&hook);

        let update = capture.handle_edge(&KeyEdge::up("enter")).unwrap();

        assert_eq!(update, CaptureUpdate::Ignored);
        assert!(capture.is_recording());
    }

    #[test]
    fn test_manual_stop_returns_last_display_with_keys_still_held() {
        // Arrange
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = recording(&hook);
        capture.handle_edge(&KeyEdge::down("alt gr")).unwrap();
        capture.handle_edge(&KeyEdge::down("f5")).unwrap();

        // Act
        let captured = capture.stop().unwrap();

        // Assert
        assert_eq!(captured.combination, "alt+f5");
        assert!(!hook.is_exclusive());
        assert_eq!(
            capture.handle_edge(&KeyEdge::up("f5")).unwrap(),
            CaptureUpdate::Ignored
        );
    }

    #[test]
    fn test_stop_when_idle_is_an_error() {
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = HotkeyCapture::new(hook);
        assert!(matches!(capture.stop(), Err(CaptureError::NotRecording)));
    }

    #[test]
    fn test_failed_acquire_still_releases_hook() {
        // Arrange
        let hook = Arc::new(MockKeyboardHook::new());
        hook.fail_next_acquire();
        let mut capture = HotkeyCapture::new(hook.clone());

        // Act
        let result = capture.start(SlotId::A, noop_sink());

        // Assert
        assert!(matches!(result, Err(CaptureError::HookAcquire(_))));
        assert!(!capture.is_recording());
        assert_eq!(hook.release_count(), 1);
    }

    #[test]
    fn test_failed_release_leaves_recorder_idle() {
        // Arrange
        let hook = Arc::new(MockKeyboardHook::new());
        let mut capture = recording(&hook);
        hook.fail_next_release();

        // Act
        let result = capture.stop();

        // Assert
        assert!(matches!(result, Err(CaptureError::HookRelease(_))));
        assert!(!capture.is_recording());
    }

    #[test]
    fn test_drop_while_recording_releases_hook() {
        let hook = Arc::new(MockKeyboardHook::new());
        {
            let _capture = recording(&hook);
            assert!(hook.is_exclusive());
        }
        assert!(!hook.is_exclusive());
    }
}
