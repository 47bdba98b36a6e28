//! Mock keyboard hook for tests.
//!
//! Tests play the role of the hook thread: [`MockKeyboardHook::emit`] hands an
//! edge to the sink registered by `acquire_exclusive`, exactly as the Windows
//! hook callback would.  Acquisition and release can be made to fail once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::application::capture_hotkey::{CaptureError, EdgeSink, KeyEdge, KeyboardHook};

#[derive(Default)]
pub struct MockKeyboardHook {
    sink: Mutex<Option<EdgeSink>>,
    exclusive: AtomicBool,
    fail_acquire: AtomicBool,
    fail_release: AtomicBool,
    acquire_count: AtomicUsize,
    release_count: AtomicUsize,
}

impl MockKeyboardHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `acquire_exclusive` fails with `HookAcquire`.
    pub fn fail_next_acquire(&self) {
        self.fail_acquire.store(true, Ordering::SeqCst);
    }

    /// The next `release_exclusive` fails with `HookRelease`.
    pub fn fail_next_release(&self) {
        self.fail_release.store(true, Ordering::SeqCst);
    }

    pub fn acquire_count(&self) -> usize {
        self.acquire_count.load(Ordering::SeqCst)
    }

    /// Calls to `release_exclusive`, including no-op ones.
    pub fn release_count(&self) -> usize {
        self.release_count.load(Ordering::SeqCst)
    }

    /// Delivers `edge` to the sink.  Returns `false` if the hook is not held,
    /// in which case the edge would have passed through to the system.
    pub fn emit(&self, edge: KeyEdge) -> bool {
        match self.lock_sink().as_ref() {
            Some(sink) => {
                sink(edge);
                true
            }
            None => false,
        }
    }

    fn lock_sink(&self) -> MutexGuard<'_, Option<EdgeSink>> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyboardHook for MockKeyboardHook {
    fn acquire_exclusive(&self, sink: EdgeSink) -> Result<(), CaptureError> {
        if self.fail_acquire.swap(false, Ordering::SeqCst) {
            return Err(CaptureError::HookAcquire("mock failure".into()));
        }
        if self.exclusive.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::HookAcquire("already held".into()));
        }
        self.acquire_count.fetch_add(1, Ordering::SeqCst);
        *self.lock_sink() = Some(sink);
        Ok(())
    }

    fn release_exclusive(&self) -> Result<(), CaptureError> {
        self.release_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_release.swap(false, Ordering::SeqCst) {
            return Err(CaptureError::HookRelease("mock failure".into()));
        }
        *self.lock_sink() = None;
        self.exclusive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_exclusive(&self) -> bool {
        self.exclusive.load(Ordering::SeqCst)
    }
}
