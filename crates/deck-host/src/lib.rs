//! deck-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does deck-host do? (for beginners)
//!
//! The *deck* is a small USB microcontroller with eight buttons labelled
//! `A` to `H`.  It shows up as a serial port and sends one letter per line
//! whenever a button is pressed.  The host turns those letters into input on
//! this computer.
//!
//! The host application:
//!
//! 1. Scans the serial ports and finds the deck by sending `TEST` and waiting
//!    for `DECK`.
//! 2. Keeps the link alive with `PING`/`PONG`, and reconnects with a growing
//!    backoff (2 s, 3 s, 4.5 s, ... up to 30 s) when the deck goes away.
//! 3. Looks up the action assigned to each pressed button and performs it:
//!    typing text, tapping a key (F13–F24 included), pressing a key chord, or
//!    a volume/media control.  Presses closer than 100 ms apart are dropped.
//! 4. Records new hotkeys by holding an exclusive keyboard hook while the user
//!    presses a combination, and saves the result to the config file.

/// Application layer: use cases for the host.
pub mod application;

/// Infrastructure layer: serial ports, OS input, keyboard hook, config and UI bridge.
pub mod infrastructure;
