//! Platform-specific input emulation implementations.
//!
//! The correct implementation is selected at compile time via `#[cfg(target_os = ...)]`.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub mod linux;

use std::sync::Arc;

use crate::application::execute_action::{EmulationError, PlatformInputEmulator};

/// Creates the emulator for the platform this binary was built for.
///
/// # Errors
///
/// Returns `EmulationError::Platform` when the platform has no emulator or
/// the OS refused a connection (e.g. no X display).
pub fn native_emulator() -> Result<Arc<dyn PlatformInputEmulator>, EmulationError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsInputEmulator::new()))
    }
    #[cfg(target_os = "linux")]
    {
        Ok(Arc::new(linux::LinuxXTestEmulator::new()?))
    }
    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        Err(EmulationError::Platform(
            "input emulation is not supported on this platform".into(),
        ))
    }
}
