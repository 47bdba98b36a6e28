//! # deck-core
//!
//! Shared library for DeckLink containing the device wire protocol, the
//! action and slot model, and key code translation tables.
//!
//! It has zero dependencies on OS APIs, serial drivers, or UI frameworks.
//!
//! # Architecture overview (for beginners)
//!
//! DeckLink drives a small USB button deck: a microcontroller with eight
//! buttons that reports each press as a single letter over a serial line.  The
//! host maps each button to an input action (typing text, tapping a key,
//! pressing a key chord, or a volume/media control) and performs it.
//!
//! This crate (`deck-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How lines travel over the serial link (`TEST`/`DECK`
//!   handshake, `PING`/`PONG` keepalive, slot letters) and how a raw byte
//!   stream is split into frames.
//!
//! - **`domain`** – Pure logic with no OS dependencies: button slots, action
//!   descriptors, canonical key chords, reconnection backoff and the dispatch
//!   throttle.
//!
//! - **`keymap`** – The named key catalogue and the tables that convert a key
//!   into a Windows virtual-key code or an X11 KeySym.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `deck_core::SlotId` instead of `deck_core::domain::slot::SlotId`.
pub use domain::action::{
    ActionDescriptor, ActionKind, ActionParseError, ActionSettings, MediaCommand, VolumeDirection,
};
pub use domain::link::{Backoff, ConnectionState};
pub use domain::slot::{SlotId, SlotTable, UnknownSlot};
pub use domain::throttle::Throttle;
pub use keymap::{Key, KeyMapper, UnknownKey};
pub use protocol::{InboundFrame, LineDecoder};
