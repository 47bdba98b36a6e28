//! Action descriptors: what a button does when pressed.
//!
//! An [`ActionDescriptor`] is a closed set of effects.  It is validated when it
//! is built (from the settings triple or from a legacy action string), so the
//! executor never meets an unrecognised action at dispatch time.
//!
//! # Settings triple
//!
//! The settings store keeps each slot as `{type, subtype, text}`:
//!
//! | type     | subtype            | text          | descriptor                 |
//! |----------|--------------------|---------------|----------------------------|
//! | `text`   | (ignored)          | `hello`       | `Text("hello")`            |
//! | `press`  | `press:f16`        | (ignored)     | `KeyPress(F16)`            |
//! | `hotkey` | (ignored)          | `ctrl+alt+f5` | `Hotkey([ctrl, alt, f5])`  |
//! | `volume` | `volume:up`        | (ignored)     | `Volume(Up)`               |
//! | `media`  | `media:play/pause` | (ignored)     | `Media(PlayPause)`         |
//!
//! # Legacy action strings
//!
//! Older configurations store a single string per slot: `hotkey:ctrl+c`,
//! `press:enter`, `volume:mute`, `media:next`; anything without a known prefix
//! is literal text.  [`ActionDescriptor::parse_legacy`] reads that form and
//! `Display` writes it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::slot::SlotId;
use crate::keymap::Key;

const PRESS_PREFIX: &str = "press:";
const HOTKEY_PREFIX: &str = "hotkey:";
const VOLUME_PREFIX: &str = "volume:";
const MEDIA_PREFIX: &str = "media:";

/// Errors produced while building a descriptor from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    /// The `type` field is not one of the known action kinds.
    #[error("unknown action type: {0:?}")]
    UnknownKind(String),

    /// A key name in a press or hotkey action is not in the key catalogue.
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),

    /// A hotkey combination contains no keys.
    #[error("hotkey combination is empty")]
    EmptyHotkey,

    /// The volume subtype is not `up`, `down` or `mute`.
    #[error("unknown volume control: {0:?}")]
    UnknownVolume(String),

    /// The media subtype is not `play/pause`, `next`, `previous` or `stop`.
    #[error("unknown media control: {0:?}")]
    UnknownMedia(String),

    /// A function key outside `f1`–`f24`.
    #[error("function key f{0} is out of range (f1-f24)")]
    InvalidFunctionKey(u32),
}

// ── Volume and media controls ─────────────────────────────────────────────────

/// System volume control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeDirection {
    Up,
    Down,
    Mute,
}

impl VolumeDirection {
    pub const ALL: [VolumeDirection; 3] =
        [VolumeDirection::Up, VolumeDirection::Down, VolumeDirection::Mute];

    pub fn name(self) -> &'static str {
        match self {
            VolumeDirection::Up => "up",
            VolumeDirection::Down => "down",
            VolumeDirection::Mute => "mute",
        }
    }

    /// The consumer-control key that performs this action.
    pub fn key(self) -> Key {
        match self {
            VolumeDirection::Up => Key::VolumeUp,
            VolumeDirection::Down => Key::VolumeDown,
            VolumeDirection::Mute => Key::VolumeMute,
        }
    }
}

impl FromStr for VolumeDirection {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        VolumeDirection::ALL
            .into_iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| ActionParseError::UnknownVolume(s.to_string()))
    }
}

/// Media transport control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCommand {
    PlayPause,
    Next,
    Previous,
    Stop,
}

impl MediaCommand {
    pub const ALL: [MediaCommand; 4] = [
        MediaCommand::PlayPause,
        MediaCommand::Next,
        MediaCommand::Previous,
        MediaCommand::Stop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MediaCommand::PlayPause => "play/pause",
            MediaCommand::Next => "next",
            MediaCommand::Previous => "previous",
            MediaCommand::Stop => "stop",
        }
    }

    /// The consumer-control key that performs this action.
    pub fn key(self) -> Key {
        match self {
            MediaCommand::PlayPause => Key::PlayPause,
            MediaCommand::Next => Key::NextTrack,
            MediaCommand::Previous => Key::PreviousTrack,
            MediaCommand::Stop => Key::StopMedia,
        }
    }
}

impl FromStr for MediaCommand {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        MediaCommand::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| ActionParseError::UnknownMedia(s.to_string()))
    }
}

// ── Settings triple ───────────────────────────────────────────────────────────

/// The `type` field of a slot's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Text,
    Press,
    Hotkey,
    Volume,
    Media,
}

impl FromStr for ActionKind {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ActionKind::Text),
            "press" => Ok(ActionKind::Press),
            "hotkey" => Ok(ActionKind::Hotkey),
            "volume" => Ok(ActionKind::Volume),
            "media" => Ok(ActionKind::Media),
            _ => Err(ActionParseError::UnknownKind(s.to_string())),
        }
    }
}

/// Persisted form of one slot: `{type, subtype, text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSettings {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub text: String,
}

// ── Descriptor ────────────────────────────────────────────────────────────────

/// An input effect bound to a button.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionDescriptor {
    /// Type a literal character sequence.
    Text(String),
    /// Tap a single key.
    KeyPress(Key),
    /// Press all keys together, then release them together.
    Hotkey(Vec<Key>),
    /// System volume up/down/mute.
    Volume(VolumeDirection),
    /// Media transport control.
    Media(MediaCommand),
}

impl ActionDescriptor {
    /// Builds a `Hotkey` descriptor from a `+`-joined combination such as
    /// `"ctrl+alt+f5"`.  Key order is preserved as written.
    pub fn hotkey(combination: &str) -> Result<Self, ActionParseError> {
        let keys = combination
            .split('+')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(parse_key)
            .collect::<Result<Vec<_>, _>>()?;
        if keys.is_empty() {
            return Err(ActionParseError::EmptyHotkey);
        }
        Ok(ActionDescriptor::Hotkey(keys))
    }

    /// Builds a `KeyPress` descriptor from a key name, with or without the
    /// `press:` prefix.
    pub fn key_press(name: &str) -> Result<Self, ActionParseError> {
        let name = name.trim();
        let name = name.strip_prefix(PRESS_PREFIX).unwrap_or(name);
        parse_key(name).map(ActionDescriptor::KeyPress)
    }

    /// Validates a settings triple and builds the descriptor it describes.
    pub fn from_settings(settings: &ActionSettings) -> Result<Self, ActionParseError> {
        let subtype = settings.subtype.trim();
        match settings.kind {
            ActionKind::Text => Ok(ActionDescriptor::Text(settings.text.clone())),
            ActionKind::Press => ActionDescriptor::key_press(subtype),
            ActionKind::Hotkey => {
                let combination = if settings.text.trim().is_empty() {
                    subtype.strip_prefix(HOTKEY_PREFIX).unwrap_or(subtype)
                } else {
                    settings.text.as_str()
                };
                ActionDescriptor::hotkey(combination)
            }
            ActionKind::Volume => subtype
                .strip_prefix(VOLUME_PREFIX)
                .unwrap_or(subtype)
                .parse()
                .map(ActionDescriptor::Volume),
            ActionKind::Media => subtype
                .strip_prefix(MEDIA_PREFIX)
                .unwrap_or(subtype)
                .parse()
                .map(ActionDescriptor::Media),
        }
    }

    /// Converts the descriptor back into its settings triple.
    pub fn to_settings(&self) -> ActionSettings {
        let (kind, subtype, text) = match self {
            ActionDescriptor::Text(text) => (ActionKind::Text, String::new(), text.clone()),
            ActionDescriptor::KeyPress(key) => {
                (ActionKind::Press, format!("{PRESS_PREFIX}{key}"), String::new())
            }
            ActionDescriptor::Hotkey(keys) => {
                (ActionKind::Hotkey, String::new(), join_keys(keys))
            }
            ActionDescriptor::Volume(v) => (
                ActionKind::Volume,
                format!("{VOLUME_PREFIX}{}", v.name()),
                String::new(),
            ),
            ActionDescriptor::Media(m) => (
                ActionKind::Media,
                format!("{MEDIA_PREFIX}{}", m.name()),
                String::new(),
            ),
        };
        ActionSettings { kind, subtype, text }
    }

    /// Parses the single-string legacy action form.
    ///
    /// Strings without a recognised prefix are literal text and never fail.
    pub fn parse_legacy(action: &str) -> Result<Self, ActionParseError> {
        if let Some(combination) = action.strip_prefix(HOTKEY_PREFIX) {
            ActionDescriptor::hotkey(combination)
        } else if let Some(name) = action.strip_prefix(PRESS_PREFIX) {
            ActionDescriptor::key_press(name)
        } else if let Some(direction) = action.strip_prefix(VOLUME_PREFIX) {
            direction.parse().map(ActionDescriptor::Volume)
        } else if let Some(command) = action.strip_prefix(MEDIA_PREFIX) {
            command.parse().map(ActionDescriptor::Media)
        } else {
            Ok(ActionDescriptor::Text(action.to_string()))
        }
    }

    /// Descriptor assigned to a slot that has never been configured.
    pub fn default_for(slot: SlotId) -> Self {
        ActionDescriptor::Text(format!("{slot} button action"))
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ActionDescriptor::Text(_) => ActionKind::Text,
            ActionDescriptor::KeyPress(_) => ActionKind::Press,
            ActionDescriptor::Hotkey(_) => ActionKind::Hotkey,
            ActionDescriptor::Volume(_) => ActionKind::Volume,
            ActionDescriptor::Media(_) => ActionKind::Media,
        }
    }
}

impl fmt::Display for ActionDescriptor {
    /// Writes the legacy single-string form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionDescriptor::Text(text) => f.write_str(text),
            ActionDescriptor::KeyPress(key) => write!(f, "{PRESS_PREFIX}{key}"),
            ActionDescriptor::Hotkey(keys) => write!(f, "{HOTKEY_PREFIX}{}", join_keys(keys)),
            ActionDescriptor::Volume(v) => write!(f, "{VOLUME_PREFIX}{}", v.name()),
            ActionDescriptor::Media(m) => write!(f, "{MEDIA_PREFIX}{}", m.name()),
        }
    }
}

fn join_keys(keys: &[Key]) -> String {
    keys.iter()
        .map(Key::to_string)
        .collect::<Vec<_>>()
        .join("+")
}

/// Parses a key name, reporting out-of-range function keys distinctly.
fn parse_key(name: &str) -> Result<Key, ActionParseError> {
    name.parse::<Key>().map_err(|_| {
        let lowered = name.trim().to_lowercase();
        match lowered.strip_prefix('f').map(str::parse::<u32>) {
            Some(Ok(n)) => ActionParseError::InvalidFunctionKey(n),
            _ => ActionParseError::UnknownKey(name.to_string()),
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: ActionKind, subtype: &str, text: &str) -> ActionSettings {
        ActionSettings {
            kind,
            subtype: subtype.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_hotkey_preserves_written_order() {
        let descriptor = ActionDescriptor::hotkey("ctrl+alt+f5").unwrap();
        assert_eq!(
            descriptor,
            ActionDescriptor::Hotkey(vec![Key::Ctrl, Key::Alt, Key::Function(5)])
        );
    }

    #[test]
    fn test_hotkey_rejects_empty_and_unknown_keys() {
        assert_eq!(ActionDescriptor::hotkey(""), Err(ActionParseError::EmptyHotkey));
        assert_eq!(ActionDescriptor::hotkey("+"), Err(ActionParseError::EmptyHotkey));
        assert_eq!(
            ActionDescriptor::hotkey("ctrl+hyper"),
            Err(ActionParseError::UnknownKey("hyper".to_string()))
        );
    }

    #[test]
    fn test_press_rejects_function_keys_beyond_f24() {
        assert_eq!(
            ActionDescriptor::key_press("press:f25"),
            Err(ActionParseError::InvalidFunctionKey(25))
        );
    }

    #[test]
    fn test_from_settings_builds_each_kind() {
        assert_eq!(
            ActionDescriptor::from_settings(&settings(ActionKind::Text, "", "hello")),
            Ok(ActionDescriptor::Text("hello".to_string()))
        );
        assert_eq!(
            ActionDescriptor::from_settings(&settings(ActionKind::Press, "press:f16", "")),
            Ok(ActionDescriptor::KeyPress(Key::Function(16)))
        );
        assert_eq!(
            ActionDescriptor::from_settings(&settings(ActionKind::Hotkey, "", "ctrl+shift+a")),
            Ok(ActionDescriptor::Hotkey(vec![Key::Ctrl, Key::Shift, Key::Char('a')]))
        );
        assert_eq!(
            ActionDescriptor::from_settings(&settings(ActionKind::Volume, "volume:mute", "")),
            Ok(ActionDescriptor::Volume(VolumeDirection::Mute))
        );
        assert_eq!(
            ActionDescriptor::from_settings(&settings(ActionKind::Media, "media:play/pause", "")),
            Ok(ActionDescriptor::Media(MediaCommand::PlayPause))
        );
    }

    #[test]
    fn test_from_settings_rejects_bad_subtypes() {
        assert_eq!(
            ActionDescriptor::from_settings(&settings(ActionKind::Volume, "volume:loud", "")),
            Err(ActionParseError::UnknownVolume("loud".to_string()))
        );
        assert_eq!(
            ActionDescriptor::from_settings(&settings(ActionKind::Media, "media:rewind", "")),
            Err(ActionParseError::UnknownMedia("rewind".to_string()))
        );
    }

    #[test]
    fn test_settings_triple_survives_conversion() {
        let descriptors = [
            ActionDescriptor::Text("hi there".to_string()),
            ActionDescriptor::KeyPress(Key::PageUp),
            ActionDescriptor::hotkey("ctrl+alt+f5").unwrap(),
            ActionDescriptor::Volume(VolumeDirection::Down),
            ActionDescriptor::Media(MediaCommand::Previous),
        ];
        for descriptor in descriptors {
            let back = ActionDescriptor::from_settings(&descriptor.to_settings());
            assert_eq!(back, Ok(descriptor));
        }
    }

    #[test]
    fn test_legacy_strings_parse_by_prefix() {
        assert_eq!(
            ActionDescriptor::parse_legacy("hotkey:ctrl+c"),
            Ok(ActionDescriptor::Hotkey(vec![Key::Ctrl, Key::Char('c')]))
        );
        assert_eq!(
            ActionDescriptor::parse_legacy("press:esc"),
            Ok(ActionDescriptor::KeyPress(Key::Escape))
        );
        assert_eq!(
            ActionDescriptor::parse_legacy("media:next"),
            Ok(ActionDescriptor::Media(MediaCommand::Next))
        );
        assert_eq!(
            ActionDescriptor::parse_legacy("good morning"),
            Ok(ActionDescriptor::Text("good morning".to_string()))
        );
    }

    #[test]
    fn test_display_writes_legacy_form() {
        assert_eq!(
            ActionDescriptor::hotkey("ctrl+alt+f5").unwrap().to_string(),
            "hotkey:ctrl+alt+f5"
        );
        assert_eq!(
            ActionDescriptor::Volume(VolumeDirection::Up).to_string(),
            "volume:up"
        );
    }

    #[test]
    fn test_action_kind_serializes_lowercase() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            slot: ActionSettings,
        }

        // Arrange
        let wrapper = Wrapper {
            slot: settings(ActionKind::Hotkey, "", "ctrl+a"),
        };

        // Act
        let text = toml::to_string(&wrapper).unwrap();
        let back: Wrapper = toml::from_str(&text).unwrap();

        // Assert
        assert!(text.contains("type = \"hotkey\""), "got: {text}");
        assert_eq!(back.slot, wrapper.slot);
    }
}
