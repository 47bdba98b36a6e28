//! [`Key`] to X11 KeySym translation for the Linux injector.
//!
//! X11 KeySym values are defined in X11/keysymdef.h and X11/XF86keysym.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # What is an X11 KeySym? (for beginners)
//!
//! X11 is the windowing system used on Linux (and other Unix-like systems).
//! It uses a system called **KeySym** (Key Symbol) to identify keys.
//!
//! Unlike Windows VK codes (which identify physical key positions), X11 KeySyms
//! can represent *characters* as well as physical keys.  For example:
//!
//! | KeySym name | Value  | Meaning        |
//! |-------------|--------|----------------|
//! | `XK_a`      | 0x0061 | lowercase 'a'  |
//! | `XK_Return` | 0xFF0D | Enter key      |
//! | `XK_F13`    | 0xFFCA | F13            |
//!
//! Letters use their lowercase KeySym; the injector holds Shift itself when
//! it needs an uppercase character.
//!
//! Volume and media keys live in the vendor-specific XF86 range (0x1008FFxx).

use super::key::{Key, MAX_FUNCTION_KEY};

/// `XK_F1`; `XK_F1`..`XK_F35` are contiguous.
pub const XK_F1: u32 = 0xFFBE;

/// Keysyms above Latin-1 are encoded as `0x01000000 | codepoint`.
const UNICODE_KEYSYM_OFFSET: u32 = 0x0100_0000;

/// Translates a [`Key`] to an X11 KeySym value.
///
/// Returns `None` for character keys outside Latin-1.
pub fn key_to_keysym(key: Key) -> Option<u32> {
    let keysym = match key {
        Key::Char(c) => return latin1_keysym(c),
        Key::Function(n) if (1..=MAX_FUNCTION_KEY).contains(&n) => XK_F1 + u32::from(n - 1),
        Key::Function(_) => return None,

        Key::Enter => 0xFF0D,       // XK_Return
        Key::Escape => 0xFF1B,      // XK_Escape
        Key::Tab => 0xFF09,         // XK_Tab
        Key::Space => 0x0020,       // XK_space
        Key::Backspace => 0xFF08,   // XK_BackSpace
        Key::Delete => 0xFFFF,      // XK_Delete
        Key::Insert => 0xFF63,      // XK_Insert
        Key::Home => 0xFF50,        // XK_Home
        Key::End => 0xFF57,         // XK_End
        Key::PageUp => 0xFF55,      // XK_Page_Up
        Key::PageDown => 0xFF56,    // XK_Page_Down
        Key::Left => 0xFF51,        // XK_Left
        Key::Up => 0xFF52,          // XK_Up
        Key::Right => 0xFF53,       // XK_Right
        Key::Down => 0xFF54,        // XK_Down
        Key::CapsLock => 0xFFE5,    // XK_Caps_Lock
        Key::NumLock => 0xFF7F,     // XK_Num_Lock
        Key::ScrollLock => 0xFF14,  // XK_Scroll_Lock
        Key::PrintScreen => 0xFF61, // XK_Print
        Key::Pause => 0xFF13,       // XK_Pause
        Key::Menu => 0xFF67,        // XK_Menu

        Key::Ctrl => 0xFFE3,         // XK_Control_L
        Key::RightCtrl => 0xFFE4,    // XK_Control_R
        Key::Shift => 0xFFE1,        // XK_Shift_L
        Key::RightShift => 0xFFE2,   // XK_Shift_R
        Key::Alt => 0xFFE9,          // XK_Alt_L
        Key::RightAlt => 0xFFEA,     // XK_Alt_R
        Key::AltGr => 0xFE03,        // XK_ISO_Level3_Shift
        Key::Windows => 0xFFEB,      // XK_Super_L
        Key::RightWindows => 0xFFEC, // XK_Super_R

        Key::VolumeDown => 0x1008_FF11,    // XF86XK_AudioLowerVolume
        Key::VolumeMute => 0x1008_FF12,    // XF86XK_AudioMute
        Key::VolumeUp => 0x1008_FF13,      // XF86XK_AudioRaiseVolume
        Key::PlayPause => 0x1008_FF14,     // XF86XK_AudioPlay
        Key::StopMedia => 0x1008_FF15,     // XF86XK_AudioStop
        Key::PreviousTrack => 0x1008_FF16, // XF86XK_AudioPrev
        Key::NextTrack => 0x1008_FF17,     // XF86XK_AudioNext
    };
    Some(keysym)
}

/// Translates a text character to the KeySym used to type it.
///
/// Control characters that have a key of their own (newline, tab) map to
/// that key; everything else maps to its Latin-1 or Unicode keysym.
pub fn char_to_keysym(c: char) -> u32 {
    match c {
        '\n' | '\r' => 0xFF0D, // XK_Return
        '\t' => 0xFF09,        // XK_Tab
        _ => latin1_keysym(c).unwrap_or(UNICODE_KEYSYM_OFFSET | u32::from(c)),
    }
}

/// Latin-1 printable characters share their code point with their keysym.
fn latin1_keysym(c: char) -> Option<u32> {
    let cp = u32::from(c);
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => Some(cp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_keys_are_contiguous_from_f1() {
        assert_eq!(key_to_keysym(Key::Function(1)), Some(0xFFBE));
        assert_eq!(key_to_keysym(Key::Function(13)), Some(0xFFCA));
        assert_eq!(key_to_keysym(Key::Function(24)), Some(0xFFD5));
    }

    #[test]
    fn test_letters_use_lowercase_latin1_keysyms() {
        assert_eq!(key_to_keysym(Key::Char('a')), Some(0x61));
        assert_eq!(key_to_keysym(Key::Char('/')), Some(0x2F));
    }

    #[test]
    fn test_media_keys_use_xf86_keysyms() {
        assert_eq!(key_to_keysym(Key::VolumeUp), Some(0x1008_FF13));
        assert_eq!(key_to_keysym(Key::PlayPause), Some(0x1008_FF14));
    }

    #[test]
    fn test_char_to_keysym_maps_newline_and_unicode() {
        assert_eq!(char_to_keysym('\n'), 0xFF0D);
        assert_eq!(char_to_keysym('\t'), 0xFF09);
        assert_eq!(char_to_keysym('A'), 0x41);
        assert_eq!(char_to_keysym('é'), 0xE9);
        assert_eq!(char_to_keysym('€'), 0x0100_20AC);
    }
}
