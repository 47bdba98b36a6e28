//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate directory.
//! - Writing slot assignments back to disk as soon as they change.
//! - Providing defaults when the file does not exist yet (first run).

pub mod config;
