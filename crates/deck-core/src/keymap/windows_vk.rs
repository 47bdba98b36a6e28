//! [`Key`] ↔ Windows Virtual Key (VK) code translation.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # What is a Windows Virtual Key (VK) code? (for beginners)
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code".
//! These are defined in `<winuser.h>` and named `VK_*` (e.g., `VK_RETURN = 0x0D`,
//! `VK_F13 = 0x7C`).  They represent *logical* keys rather than physical scan
//! codes: pressing the letter A on any layout produces `VK_A = 0x41`.
//!
//! Both directions are needed: the injector turns a [`Key`] into a VK code,
//! and the low-level keyboard hook turns the VK code it observes back into a
//! [`Key`] so the hotkey recorder can name it.

use super::key::{Key, MAX_FUNCTION_KEY};

/// `VK_F1`; `VK_F1`..`VK_F24` are contiguous.
pub const VK_F1: u8 = 0x70;
/// `VK_F13`, the first function key with no symbolic name in most key tables.
pub const VK_F13: u8 = 0x7C;

/// Returns the virtual-key code for function key `number` (1–24).
///
/// Keys 13–24 are addressed relative to `VK_F13`, which is where the
/// low-level injection path starts.
pub fn function_key_vk(number: u8) -> Option<u8> {
    match number {
        1..=12 => Some(VK_F1 + (number - 1)),
        13..=MAX_FUNCTION_KEY => Some(VK_F13 + (number - 13)),
        _ => None,
    }
}

/// Translates a [`Key`] to a Windows VK code.
///
/// Returns `None` for characters that have no dedicated key on a US layout.
pub fn key_to_vk(key: Key) -> Option<u8> {
    let vk = match key {
        Key::Char(c) if c.is_ascii_lowercase() => c.to_ascii_uppercase() as u8,
        Key::Char(c) if c.is_ascii_digit() => c as u8,
        Key::Char(c) => return punctuation_vk(c),
        Key::Function(n) => return function_key_vk(n),

        Key::Enter => 0x0D,       // VK_RETURN
        Key::Escape => 0x1B,      // VK_ESCAPE
        Key::Tab => 0x09,         // VK_TAB
        Key::Space => 0x20,       // VK_SPACE
        Key::Backspace => 0x08,   // VK_BACK
        Key::Delete => 0x2E,      // VK_DELETE
        Key::Insert => 0x2D,      // VK_INSERT
        Key::Home => 0x24,        // VK_HOME
        Key::End => 0x23,         // VK_END
        Key::PageUp => 0x21,      // VK_PRIOR
        Key::PageDown => 0x22,    // VK_NEXT
        Key::Left => 0x25,        // VK_LEFT
        Key::Up => 0x26,          // VK_UP
        Key::Right => 0x27,       // VK_RIGHT
        Key::Down => 0x28,        // VK_DOWN
        Key::CapsLock => 0x14,    // VK_CAPITAL
        Key::NumLock => 0x90,     // VK_NUMLOCK
        Key::ScrollLock => 0x91,  // VK_SCROLL
        Key::PrintScreen => 0x2C, // VK_SNAPSHOT
        Key::Pause => 0x13,       // VK_PAUSE
        Key::Menu => 0x5D,        // VK_APPS

        Key::Ctrl => 0xA2,         // VK_LCONTROL
        Key::RightCtrl => 0xA3,    // VK_RCONTROL
        Key::Shift => 0xA0,        // VK_LSHIFT
        Key::RightShift => 0xA1,   // VK_RSHIFT
        Key::Alt => 0xA4,          // VK_LMENU
        Key::RightAlt => 0xA5,     // VK_RMENU
        Key::AltGr => 0xA5,        // AltGr arrives as VK_RMENU
        Key::Windows => 0x5B,      // VK_LWIN
        Key::RightWindows => 0x5C, // VK_RWIN

        Key::VolumeMute => 0xAD,    // VK_VOLUME_MUTE
        Key::VolumeDown => 0xAE,    // VK_VOLUME_DOWN
        Key::VolumeUp => 0xAF,      // VK_VOLUME_UP
        Key::NextTrack => 0xB0,     // VK_MEDIA_NEXT_TRACK
        Key::PreviousTrack => 0xB1, // VK_MEDIA_PREV_TRACK
        Key::StopMedia => 0xB2,     // VK_MEDIA_STOP
        Key::PlayPause => 0xB3,     // VK_MEDIA_PLAY_PAUSE
    };
    Some(vk)
}

/// Translates a Windows VK code observed by the keyboard hook to a [`Key`].
///
/// Generic modifier codes (`VK_CONTROL`, `VK_SHIFT`, `VK_MENU`) map to the
/// left-side key.  Returns `None` for VK codes outside the catalogue
/// (mouse buttons, IME keys, browser keys, ...).
pub fn vk_to_key(vk: u8) -> Option<Key> {
    let key = match vk {
        0x41..=0x5A => Key::Char((vk as char).to_ascii_lowercase()),
        0x30..=0x39 => Key::Char(vk as char),
        0x70..=0x87 => Key::Function(vk - VK_F1 + 1),

        0x0D => Key::Enter,
        0x1B => Key::Escape,
        0x09 => Key::Tab,
        0x20 => Key::Space,
        0x08 => Key::Backspace,
        0x2E => Key::Delete,
        0x2D => Key::Insert,
        0x24 => Key::Home,
        0x23 => Key::End,
        0x21 => Key::PageUp,
        0x22 => Key::PageDown,
        0x25 => Key::Left,
        0x26 => Key::Up,
        0x27 => Key::Right,
        0x28 => Key::Down,
        0x14 => Key::CapsLock,
        0x90 => Key::NumLock,
        0x91 => Key::ScrollLock,
        0x2C => Key::PrintScreen,
        0x13 => Key::Pause,
        0x5D => Key::Menu,

        0x11 | 0xA2 => Key::Ctrl,
        0xA3 => Key::RightCtrl,
        0x10 | 0xA0 => Key::Shift,
        0xA1 => Key::RightShift,
        0x12 | 0xA4 => Key::Alt,
        0xA5 => Key::RightAlt,
        0x5B => Key::Windows,
        0x5C => Key::RightWindows,

        0xAD => Key::VolumeMute,
        0xAE => Key::VolumeDown,
        0xAF => Key::VolumeUp,
        0xB0 => Key::NextTrack,
        0xB1 => Key::PreviousTrack,
        0xB2 => Key::StopMedia,
        0xB3 => Key::PlayPause,

        other => return punctuation_key(other),
    };
    Some(key)
}

/// Returns `true` if the VK code must be injected with `KEYEVENTF_EXTENDEDKEY`.
pub fn is_extended_vk(vk: u8) -> bool {
    matches!(
        vk,
        0x21..=0x28 // navigation cluster
            | 0x2D | 0x2E // Insert, Delete
            | 0x5B | 0x5C | 0x5D // Win keys, Apps
            | 0xA3 | 0xA5 // Right Ctrl, Right Alt
            | 0x2C // Print Screen
            | 0x90 // Num Lock
            | 0xAD..=0xB3 // volume and media keys
    )
}

/// VK_OEM_* codes for US-layout punctuation.
const PUNCTUATION_VKS: &[(char, u8)] = &[
    (';', 0xBA),  // VK_OEM_1
    ('=', 0xBB),  // VK_OEM_PLUS
    (',', 0xBC),  // VK_OEM_COMMA
    ('-', 0xBD),  // VK_OEM_MINUS
    ('.', 0xBE),  // VK_OEM_PERIOD
    ('/', 0xBF),  // VK_OEM_2
    ('`', 0xC0),  // VK_OEM_3
    ('[', 0xDB),  // VK_OEM_4
    ('\\', 0xDC), // VK_OEM_5
    (']', 0xDD),  // VK_OEM_6
    ('\'', 0xDE), // VK_OEM_7
];

fn punctuation_vk(c: char) -> Option<u8> {
    PUNCTUATION_VKS.iter().find(|(ch, _)| *ch == c).map(|(_, vk)| *vk)
}

fn punctuation_key(vk: u8) -> Option<Key> {
    PUNCTUATION_VKS
        .iter()
        .find(|(_, code)| *code == vk)
        .map(|(ch, _)| Key::Char(*ch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_key_vk_matches_windows_constants() {
        assert_eq!(function_key_vk(1), Some(0x70));
        assert_eq!(function_key_vk(12), Some(0x7B));
        assert_eq!(function_key_vk(13), Some(0x7C));
        assert_eq!(function_key_vk(16), Some(0x7F));
        assert_eq!(function_key_vk(24), Some(0x87));
    }

    #[test]
    fn test_function_key_vk_rejects_out_of_range_numbers() {
        assert_eq!(function_key_vk(0), None);
        assert_eq!(function_key_vk(25), None);
    }

    #[test]
    fn test_letters_map_to_uppercase_ascii_vk() {
        assert_eq!(key_to_vk(Key::Char('a')), Some(0x41));
        assert_eq!(key_to_vk(Key::Char('z')), Some(0x5A));
        assert_eq!(vk_to_key(0x41), Some(Key::Char('a')));
    }

    #[test]
    fn test_every_key_with_a_vk_round_trips() {
        let keys = [
            Key::Char('q'),
            Key::Char('5'),
            Key::Char(';'),
            Key::Function(7),
            Key::Function(20),
            Key::Enter,
            Key::PageDown,
            Key::Ctrl,
            Key::RightCtrl,
            Key::RightShift,
            Key::Windows,
            Key::VolumeUp,
            Key::PlayPause,
        ];
        for key in keys {
            // Arrange
            let vk = key_to_vk(key).expect("key must have a VK code");

            // Act
            let back = vk_to_key(vk);

            // Assert
            assert_eq!(back, Some(key), "round-trip for {key} via 0x{vk:02X}");
        }
    }

    #[test]
    fn test_generic_modifier_vks_map_to_left_side_keys() {
        assert_eq!(vk_to_key(0x11), Some(Key::Ctrl));
        assert_eq!(vk_to_key(0x10), Some(Key::Shift));
        assert_eq!(vk_to_key(0x12), Some(Key::Alt));
    }

    #[test]
    fn test_unmapped_vk_returns_none() {
        // VK_LBUTTON and VK_BROWSER_BACK have no catalogued key.
        assert_eq!(vk_to_key(0x01), None);
        assert_eq!(vk_to_key(0xA6), None);
    }

    #[test]
    fn test_media_keys_are_extended() {
        assert!(is_extended_vk(0xB3));
        assert!(is_extended_vk(0xAF));
        assert!(!is_extended_vk(0x41));
    }
}
