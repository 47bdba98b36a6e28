//! Windows input emulation via SendInput and keybd_event.
//!
//! Catalogued keys go through `SendInput` with their virtual-key code.
//! Raw virtual keys (F13–F24) go through `keybd_event`, which forwards the
//! code untouched.  Text is typed as `KEYEVENTF_UNICODE` events, so it does not
//! depend on the active keyboard layout.

#![cfg(target_os = "windows")]

use deck_core::keymap::windows_vk::is_extended_vk;
use deck_core::{Key, KeyMapper};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    keybd_event, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_RETURN, VK_TAB,
};

use crate::application::execute_action::{EmulationError, PlatformInputEmulator};

/// Windows implementation of [`PlatformInputEmulator`].
pub struct WindowsInputEmulator;

impl WindowsInputEmulator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsInputEmulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformInputEmulator for WindowsInputEmulator {
    fn emit_key(&self, key: Key, pressed: bool) -> Result<(), EmulationError> {
        let vk = KeyMapper::key_to_windows_vk(key).ok_or(EmulationError::UnmappedKey(key))?;
        send_inputs(&[vk_input(vk as u16, pressed)])
    }

    fn emit_virtual_key(&self, vk: u8, pressed: bool) -> Result<(), EmulationError> {
        let mut flags = KEYBD_EVENT_FLAGS(0);
        if !pressed {
            flags |= KEYEVENTF_KEYUP;
        }
        if is_extended_vk(vk) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        // SAFETY: keybd_event only queues an event; every argument is by value.
        unsafe { keybd_event(vk, 0, flags, 0) };
        Ok(())
    }

    fn emit_text(&self, text: &str) -> Result<(), EmulationError> {
        let mut inputs = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            match c {
                '\n' => push_tap(&mut inputs, VK_RETURN.0),
                '\t' => push_tap(&mut inputs, VK_TAB.0),
                '\r' => {}
                _ => {
                    let mut units = [0u16; 2];
                    for &unit in c.encode_utf16(&mut units).iter() {
                        inputs.push(unicode_input(unit, true));
                        inputs.push(unicode_input(unit, false));
                    }
                }
            }
        }
        if inputs.is_empty() {
            return Ok(());
        }
        send_inputs(&inputs)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn vk_input(vk: u16, pressed: bool) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if !pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    if u8::try_from(vk).map_or(false, is_extended_vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    keyboard_input(vk, 0, flags)
}

fn unicode_input(unit: u16, pressed: bool) -> INPUT {
    let mut flags = KEYEVENTF_UNICODE;
    if !pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    keyboard_input(0, unit, flags)
}

fn push_tap(inputs: &mut Vec<INPUT>, vk: u16) {
    inputs.push(vk_input(vk, true));
    inputs.push(vk_input(vk, false));
}

fn send_inputs(inputs: &[INPUT]) -> Result<(), EmulationError> {
    // SAFETY: every element is a fully initialised KEYBDINPUT.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize == inputs.len() {
        Ok(())
    } else {
        // SendInput is blocked by UIPI when the foreground window runs elevated.
        Err(EmulationError::Platform(format!(
            "SendInput injected {sent} of {} events: {}",
            inputs.len(),
            windows::core::Error::from_win32()
        )))
    }
}
