//! Global keyboard interception for hotkey capture.
//!
//! Windows uses a `WH_KEYBOARD_LL` hook.  Other platforms have no hook yet;
//! capture reports `UnsupportedPlatform` there while everything else works.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

use std::sync::Arc;

use crate::application::capture_hotkey::{CaptureError, EdgeSink, KeyboardHook};

/// Stand-in for platforms without a capture hook.
#[derive(Debug, Default)]
pub struct UnsupportedKeyboardHook;

impl KeyboardHook for UnsupportedKeyboardHook {
    fn acquire_exclusive(&self, _sink: EdgeSink) -> Result<(), CaptureError> {
        Err(CaptureError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }

    fn release_exclusive(&self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_exclusive(&self) -> bool {
        false
    }
}

/// The keyboard hook for the platform this binary was built for.
pub fn native_keyboard_hook() -> Arc<dyn KeyboardHook> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::WindowsKeyboardHook::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(UnsupportedKeyboardHook)
    }
}
