//! Domain entities for the DeckLink button deck.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core rules of the application.
//! - Has **no** imports from OS APIs, serial drivers, or UI frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here that means: which buttons exist, what a button can do, how a recorded
//! key chord is written down, how long to wait before reconnecting, and how
//! often an action may fire.

/// Action descriptors and their persisted forms.
pub mod action;
/// Canonical key chord strings for the hotkey recorder.
pub mod chord;
/// Connection state and reconnection backoff.
pub mod link;
/// Button slot identities and the slot table.
pub mod slot;
/// Minimum-interval throttle shared by every trigger path.
pub mod throttle;
