//! Named key catalogue.
//!
//! [`Key`] is the canonical, platform-independent key representation used by
//! action descriptors and by the hotkey recorder.  Every key has exactly one
//! canonical lowercase name (e.g. `"ctrl"`, `"page up"`, `"f16"`,
//! `"play/pause media"`); that name is what appears in stored combinations
//! such as `"ctrl+alt+f5"`.
//!
//! # Why names instead of scan codes? (for beginners)
//!
//! A button deck user configures actions by *meaning* ("press F16", "type
//! ctrl+shift+a"), and those configurations are stored as text.  Names are
//! stable across keyboard layouts and operating systems; the platform layers
//! translate a [`Key`] into a Windows virtual-key code or an X11 KeySym only
//! at the moment of injection.
//!
//! Right-side modifiers have their own variants (`RightCtrl`, `RightShift`,
//! `RightAlt`, `AltGr`, `RightWindows`) because the keyboard hook reports them
//! separately.  The hotkey recorder folds most of them back onto the left-side
//! name; see [`crate::domain::chord::normalize_key_name`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Highest function key number addressable by an action (`f24`).
pub const MAX_FUNCTION_KEY: u8 = 24;

/// Punctuation characters that are valid single-character key names.
///
/// `+` is deliberately absent: it is the combination separator.
const PUNCTUATION_KEYS: &[char] = &['-', '=', '[', ']', '\\', ';', '\'', '`', ',', '.', '/'];

/// Returned when a string does not name any catalogued key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key name: {0:?}")]
pub struct UnknownKey(pub String);

/// A key that can be injected or recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A printable single-character key: `a`–`z`, `0`–`9`, or punctuation.
    Char(char),
    /// A function key `f1`–`f24`.
    Function(u8),

    // Editing and navigation
    Enter,
    Escape,
    Tab,
    Space,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,

    // Locks and system keys
    CapsLock,
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    Menu,

    // Modifiers
    Ctrl,
    RightCtrl,
    Shift,
    RightShift,
    Alt,
    RightAlt,
    AltGr,
    Windows,
    RightWindows,

    // Consumer controls
    VolumeUp,
    VolumeDown,
    VolumeMute,
    PlayPause,
    NextTrack,
    PreviousTrack,
    StopMedia,
}

/// Canonical names for every non-character, non-function key.
const NAMED_KEYS: &[(&str, Key)] = &[
    ("enter", Key::Enter),
    ("esc", Key::Escape),
    ("tab", Key::Tab),
    ("space", Key::Space),
    ("backspace", Key::Backspace),
    ("delete", Key::Delete),
    ("insert", Key::Insert),
    ("home", Key::Home),
    ("end", Key::End),
    ("page up", Key::PageUp),
    ("page down", Key::PageDown),
    ("up", Key::Up),
    ("down", Key::Down),
    ("left", Key::Left),
    ("right", Key::Right),
    ("caps lock", Key::CapsLock),
    ("num lock", Key::NumLock),
    ("scroll lock", Key::ScrollLock),
    ("print screen", Key::PrintScreen),
    ("pause", Key::Pause),
    ("menu", Key::Menu),
    ("ctrl", Key::Ctrl),
    ("right ctrl", Key::RightCtrl),
    ("shift", Key::Shift),
    ("right shift", Key::RightShift),
    ("alt", Key::Alt),
    ("right alt", Key::RightAlt),
    ("alt gr", Key::AltGr),
    ("windows", Key::Windows),
    ("right windows", Key::RightWindows),
    ("volume up", Key::VolumeUp),
    ("volume down", Key::VolumeDown),
    ("volume mute", Key::VolumeMute),
    ("play/pause media", Key::PlayPause),
    ("next track", Key::NextTrack),
    ("previous track", Key::PreviousTrack),
    ("stop media", Key::StopMedia),
];

/// Alternative spellings accepted when parsing, never produced when formatting.
const KEY_ALIASES: &[(&str, Key)] = &[
    ("escape", Key::Escape),
    ("return", Key::Enter),
    ("control", Key::Ctrl),
    ("left ctrl", Key::Ctrl),
    ("left shift", Key::Shift),
    ("left alt", Key::Alt),
    ("win", Key::Windows),
    ("left windows", Key::Windows),
    ("del", Key::Delete),
    ("pgup", Key::PageUp),
    ("pgdn", Key::PageDown),
    ("apps", Key::Menu),
];

/// Keys offered for the "press" action type, in display order.
pub const PRESS_KEY_CATALOGUE: &[Key] = &[
    Key::Enter,
    Key::Escape,
    Key::Tab,
    Key::Space,
    Key::Backspace,
    Key::Delete,
    Key::Up,
    Key::Down,
    Key::Left,
    Key::Right,
    Key::Function(1),
    Key::Function(2),
    Key::Function(3),
    Key::Function(4),
    Key::Function(5),
    Key::Function(6),
    Key::Function(7),
    Key::Function(8),
    Key::Function(9),
    Key::Function(10),
    Key::Function(11),
    Key::Function(12),
    Key::Function(13),
    Key::Function(14),
    Key::Function(15),
    Key::Function(16),
    Key::Function(17),
    Key::Function(18),
    Key::Function(19),
    Key::Function(20),
    Key::Function(21),
    Key::Function(22),
    Key::Function(23),
    Key::Function(24),
];

impl Key {
    /// Returns `true` for Ctrl, Shift, Alt, AltGr and Windows keys on either side.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Key::Ctrl
                | Key::RightCtrl
                | Key::Shift
                | Key::RightShift
                | Key::Alt
                | Key::RightAlt
                | Key::AltGr
                | Key::Windows
                | Key::RightWindows
        )
    }

    /// Returns the function key number for `f1`–`f24`, `None` otherwise.
    pub fn function_number(self) -> Option<u8> {
        match self {
            Key::Function(n) => Some(n),
            _ => None,
        }
    }

    /// Returns `true` for volume and media transport keys.
    pub fn is_consumer_control(self) -> bool {
        matches!(
            self,
            Key::VolumeUp
                | Key::VolumeDown
                | Key::VolumeMute
                | Key::PlayPause
                | Key::NextTrack
                | Key::PreviousTrack
                | Key::StopMedia
        )
    }

    /// Canonical lowercase name of this key.
    pub fn name(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Function(n) => write!(f, "f{n}"),
            named => {
                let name = NAMED_KEYS
                    .iter()
                    .find(|(_, k)| *k == named)
                    .map(|(name, _)| *name)
                    .unwrap_or("unknown");
                f.write_str(name)
            }
        }
    }
}

impl FromStr for Key {
    type Err = UnknownKey;

    /// Parses a key name case-insensitively, accepting canonical names and
    /// a handful of common aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let unknown = || UnknownKey(s.to_string());

        let mut chars = lowered.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return if c.is_ascii_alphanumeric() || PUNCTUATION_KEYS.contains(&c) {
                Ok(Key::Char(c))
            } else {
                Err(unknown())
            };
        }

        if let Some(number) = lowered.strip_prefix('f') {
            if let Ok(n) = number.parse::<u8>() {
                return if (1..=MAX_FUNCTION_KEY).contains(&n) {
                    Ok(Key::Function(n))
                } else {
                    Err(unknown())
                };
            }
        }

        NAMED_KEYS
            .iter()
            .chain(KEY_ALIASES)
            .find(|(name, _)| *name == lowered)
            .map(|(_, key)| *key)
            .ok_or_else(unknown)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
