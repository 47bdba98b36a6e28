//! Application layer use cases for the host application.
//!
//! # What use cases does the host have?
//!
//! - **`discover_device`** – Finds the deck among the serial ports by opening
//!   each candidate and running the `TEST`/`DECK` handshake.  Defines the
//!   `SerialLink` and `PortEnumerator` seams the infrastructure implements.
//!
//! - **`receive_frames`** – Drains buffered device output within a bounded
//!   window and classifies each line.
//!
//! - **`supervise_link`** – The long-running loop that owns the open link:
//!   discovery with backoff while disconnected, frame reads and `PING`
//!   keepalive while connected.
//!
//! - **`dispatch`** – Resolves a button press (from the device or from the UI)
//!   to the slot's action, throttled to one action per window.
//!
//! - **`execute_action`** – Turns an action into OS input events through a
//!   `PlatformInputEmulator` injected at construction time.
//!
//! - **`capture_hotkey`** – Records a key chord from live keyboard input while
//!   holding the global keyboard hook exclusively.

pub mod capture_hotkey;
pub mod discover_device;
pub mod dispatch;
pub mod execute_action;
pub mod receive_frames;
pub mod supervise_link;
