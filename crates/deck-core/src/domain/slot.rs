//! Button slots and the in-memory slot table.
//!
//! The deck has a fixed set of eight buttons, identified by the letters
//! `A`–`H`.  The device reports a press by sending the letter on its own line.
//! Every slot holds exactly one [`ActionDescriptor`] at all times; slots are
//! never removed, only reassigned.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::action::ActionDescriptor;

/// Number of physical buttons on the deck.
pub const SLOT_COUNT: usize = 8;

/// Returned when a string is not one of the eight slot letters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown slot id: {0:?}")]
pub struct UnknownSlot(pub String);

/// Identity of one physical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl SlotId {
    /// All slots in wire order.
    pub const ALL: [SlotId; SLOT_COUNT] = [
        SlotId::A,
        SlotId::B,
        SlotId::C,
        SlotId::D,
        SlotId::E,
        SlotId::F,
        SlotId::G,
        SlotId::H,
    ];

    /// Zero-based position of this slot (`A` = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    /// The single uppercase letter used on the wire.
    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for SlotId {
    type Err = UnknownSlot;

    /// Parses an exact uppercase slot letter.  Frames are case-sensitive:
    /// `"a"` is not a button press.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotId::ALL
            .into_iter()
            .find(|slot| {
                let mut chars = s.chars();
                chars.next() == Some(slot.letter()) && chars.next().is_none()
            })
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

/// Slot → descriptor table.  Every slot is always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    descriptors: [ActionDescriptor; SLOT_COUNT],
}

impl SlotTable {
    /// Returns the descriptor currently assigned to `slot`.
    pub fn get(&self, slot: SlotId) -> &ActionDescriptor {
        &self.descriptors[slot.index()]
    }

    /// Replaces the descriptor for `slot`, returning the previous one.
    pub fn set(&mut self, slot: SlotId, descriptor: ActionDescriptor) -> ActionDescriptor {
        std::mem::replace(&mut self.descriptors[slot.index()], descriptor)
    }

    /// Iterates over `(slot, descriptor)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &ActionDescriptor)> {
        SlotId::ALL.into_iter().zip(self.descriptors.iter())
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self {
            descriptors: SlotId::ALL.map(ActionDescriptor::default_for),
        }
    }
}
