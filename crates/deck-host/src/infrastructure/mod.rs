//! Infrastructure layer for the host application.
//!
//! Contains OS-facing adapters: serial ports, input injection, the global
//! keyboard hook, the config file and the UI bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and `deck_core`,
//! but MUST NOT be imported by the `application` or domain layers.
//!
//! # Sub-modules
//!
//! - **`serial`** – `serialport`-backed `PortEnumerator` and `SerialLink`, plus
//!   a scriptable `MockDevice` for tests.
//!
//! - **`input_emulation`** – OS-specific implementations of `PlatformInputEmulator`.
//!   The correct implementation is selected at compile time using `#[cfg(target_os)]`.
//!   A `MockInputEmulator` is also provided for tests.
//!
//! - **`keyboard_hook`** – Exclusive global keyboard interception used while
//!   recording a hotkey.  `WH_KEYBOARD_LL` on Windows.
//!
//! - **`storage`** – TOML configuration: device timing and slot assignments.
//!
//! - **`ui_bridge`** – The bounded task queue that moves events from background
//!   threads onto the UI context, and the controller that handles them there.

pub mod input_emulation;
pub mod keyboard_hook;
pub mod serial;
pub mod storage;
pub mod ui_bridge;
