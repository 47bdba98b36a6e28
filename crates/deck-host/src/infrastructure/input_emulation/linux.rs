//! Linux X11 input emulation via the XTest extension.
//!
//! # What is XTest? (for beginners)
//!
//! XTest is an X11 protocol extension that lets a process synthesize keyboard
//! events as if the user had physically pressed the keys.  The events reach
//! the focused window exactly like real input.
//!
//! `XTestFakeKeyEvent` takes an X11 *keycode*, not a KeySym, so every key is
//! translated twice:
//!
//! ```text
//! Key → X11 KeySym (deck-core table) → XKeysymToKeycode(display, keysym) → keycode
//! ```
//!
//! Text is typed one character at a time.  Characters that sit on the shifted
//! level of their key (e.g. `A`, `!`) are wrapped in a Shift press.
//!
//! # Permissions
//!
//! The process needs access to the X display named by `DISPLAY`.  If it is not
//! set or the server refuses the connection, the constructor fails with a
//! `Platform` error.

use std::ptr;
use std::sync::{Mutex, MutexGuard};

use deck_core::{Key, KeyMapper};
use x11::{xlib, xtest};

use crate::application::execute_action::{EmulationError, PlatformInputEmulator};

/// `CurrentTime`: let the server timestamp the synthesized event.
const CURRENT_TIME: xlib::Time = 0;

/// KeySym of the left Shift key.
const XK_SHIFT_L: xlib::KeySym = 0xFFE1;

/// Owned X display connection.
struct Display(*mut xlib::Display);

// SAFETY: the pointer is only dereferenced by Xlib while the surrounding
// Mutex is held, so at most one thread uses the connection at a time.
unsafe impl Send for Display {}

impl Drop for Display {
    fn drop(&mut self) {
        // SAFETY: the pointer came from XOpenDisplay and is closed exactly once.
        unsafe { xlib::XCloseDisplay(self.0) };
    }
}

/// Linux X11/XTest input emulator.
pub struct LinuxXTestEmulator {
    display: Mutex<Display>,
}

impl LinuxXTestEmulator {
    /// Connects to the X display named by `DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns `EmulationError::Platform` if the display cannot be opened or
    /// the server lacks the XTEST extension.
    pub fn new() -> Result<Self, EmulationError> {
        // SAFETY: a null name selects $DISPLAY; the result is checked below.
        let raw = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if raw.is_null() {
            return Err(EmulationError::Platform(
                "cannot open X display (is DISPLAY set?)".into(),
            ));
        }
        let display = Display(raw);

        let (mut event_base, mut error_base, mut major, mut minor) = (0, 0, 0, 0);
        // SAFETY: display is open; out-pointers are valid locals.
        let has_xtest = unsafe {
            xtest::XTestQueryExtension(
                display.0,
                &mut event_base,
                &mut error_base,
                &mut major,
                &mut minor,
            )
        };
        if has_xtest == 0 {
            return Err(EmulationError::Platform(
                "X server does not support the XTEST extension".into(),
            ));
        }

        Ok(Self {
            display: Mutex::new(display),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Display> {
        self.display
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn keycode_for(display: &Display, keysym: xlib::KeySym) -> Option<xlib::KeyCode> {
    // SAFETY: display is open for the lifetime of `Display`.
    let keycode = unsafe { xlib::XKeysymToKeycode(display.0, keysym) };
    (keycode != 0).then_some(keycode)
}

fn fake_key(display: &Display, keycode: xlib::KeyCode, pressed: bool) -> Result<(), EmulationError> {
    // SAFETY: display is open; keycode came from XKeysymToKeycode.
    let ok = unsafe {
        xtest::XTestFakeKeyEvent(
            display.0,
            u32::from(keycode),
            i32::from(pressed),
            CURRENT_TIME,
        )
    };
    if ok == 0 {
        return Err(EmulationError::Platform(format!(
            "XTestFakeKeyEvent rejected keycode {keycode}"
        )));
    }
    Ok(())
}

fn flush(display: &Display) {
    // SAFETY: display is open.
    unsafe { xlib::XFlush(display.0) };
}

/// `true` if `keysym` is only reachable on the shifted level of `keycode`.
fn needs_shift(display: &Display, keycode: xlib::KeyCode, keysym: xlib::KeySym) -> bool {
    // SAFETY: display is open; index 0 is the unshifted level.
    #[allow(deprecated)]
    let unshifted = unsafe { xlib::XKeycodeToKeysym(display.0, keycode, 0) };
    unshifted != keysym
}

impl PlatformInputEmulator for LinuxXTestEmulator {
    fn emit_key(&self, key: Key, pressed: bool) -> Result<(), EmulationError> {
        let keysym = KeyMapper::key_to_x11_keysym(key).ok_or(EmulationError::UnmappedKey(key))?;
        let display = self.lock();
        let keycode =
            keycode_for(&display, xlib::KeySym::from(keysym)).ok_or(EmulationError::UnmappedKey(key))?;
        fake_key(&display, keycode, pressed)?;
        flush(&display);
        Ok(())
    }

    fn emit_virtual_key(&self, vk: u8, pressed: bool) -> Result<(), EmulationError> {
        let key = KeyMapper::windows_vk_to_key(vk).ok_or_else(|| {
            EmulationError::Platform(format!("virtual key {vk:#04x} has no X11 equivalent"))
        })?;
        self.emit_key(key, pressed)
    }

    fn emit_text(&self, text: &str) -> Result<(), EmulationError> {
        let display = self.lock();
        let shift = keycode_for(&display, XK_SHIFT_L);

        for c in text.chars().filter(|&c| c != '\r') {
            let keysym = xlib::KeySym::from(KeyMapper::char_to_x11_keysym(c));
            let keycode = keycode_for(&display, keysym).ok_or_else(|| {
                EmulationError::Platform(format!("character {c:?} is not on the keyboard map"))
            })?;
            let shifted = match shift {
                Some(shift) if needs_shift(&display, keycode, keysym) => Some(shift),
                _ => None,
            };

            if let Some(shift) = shifted {
                fake_key(&display, shift, true)?;
            }
            let typed = fake_key(&display, keycode, true).and_then(|()| fake_key(&display, keycode, false));
            if let Some(shift) = shifted {
                fake_key(&display, shift, false)?;
            }
            typed?;
        }

        flush(&display);
        Ok(())
    }
}
