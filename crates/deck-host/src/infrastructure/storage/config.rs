//! TOML-based configuration persistence for the host application.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\DeckLink\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/decklink/config.toml` (or `~/.config/decklink`)
//! - macOS:    `~/Library/Application Support/DeckLink/config.toml`
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [device]
//! preferred_port = "COM3"
//! keepalive_interval_ms = 1000
//!
//! [slots.A]
//! type = "hotkey"
//! text = "ctrl+alt+f5"
//!
//! [slots.B]
//! type = "press"
//! subtype = "press:f16"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so a missing
//! file, an empty file and an old file all load.  Slots absent from
//! `[slots]` keep their default action.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use deck_core::{ActionDescriptor, ActionSettings, SlotId, SlotTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::discover_device::LinkSettings;
use crate::application::dispatch::{SlotStore, StoreError};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    /// Slot letter → settings triple.
    #[serde(default)]
    pub slots: BTreeMap<String, ActionSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Serial link timing.  All durations are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Port tried first during discovery, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_handshake_attempts")]
    pub handshake_attempts: u32,
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
    #[serde(default = "default_probe_window_ms")]
    pub probe_window_ms: u64,
    #[serde(default = "default_read_window_ms")]
    pub read_window_ms: u64,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_handshake_attempts() -> u32 {
    5
}
fn default_handshake_timeout_ms() -> u64 {
    500
}
fn default_keepalive_interval_ms() -> u64 {
    1000
}
fn default_probe_window_ms() -> u64 {
    100
}
fn default_read_window_ms() -> u64 {
    1000
}
fn default_initial_backoff_ms() -> u64 {
    2000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            preferred_port: None,
            baud_rate: default_baud_rate(),
            settle_ms: default_settle_ms(),
            handshake_attempts: default_handshake_attempts(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
            probe_window_ms: default_probe_window_ms(),
            read_window_ms: default_read_window_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl AppConfig {
    /// Link timing for discovery and the supervisor.
    pub fn to_link_settings(&self) -> LinkSettings {
        let device = &self.device;
        LinkSettings {
            preferred_port: device.preferred_port.clone(),
            baud_rate: device.baud_rate,
            settle: Duration::from_millis(device.settle_ms),
            handshake_attempts: device.handshake_attempts.max(1),
            handshake_timeout: Duration::from_millis(device.handshake_timeout_ms),
            keepalive_interval: Duration::from_millis(device.keepalive_interval_ms),
            probe_window: Duration::from_millis(device.probe_window_ms),
            read_window: Duration::from_millis(device.read_window_ms),
            initial_backoff: Duration::from_millis(device.initial_backoff_ms),
            max_backoff: Duration::from_millis(device.max_backoff_ms),
            ..LinkSettings::default()
        }
    }

    /// Builds the slot table.  Entries that name no slot or fail validation
    /// are logged and the slot keeps its default action.
    pub fn slot_table(&self) -> SlotTable {
        let mut table = SlotTable::default();
        for (id, settings) in &self.slots {
            let Ok(slot) = id.parse::<SlotId>() else {
                warn!(slot = %id, "ignoring settings for unknown slot");
                continue;
            };
            match ActionDescriptor::from_settings(settings) {
                Ok(descriptor) => {
                    table.set(slot, descriptor);
                }
                Err(e) => warn!(%slot, "invalid action settings, keeping default: {e}"),
            }
        }
        table
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(platform_config_dir()
        .ok_or(ConfigError::NoPlatformConfigDir)?
        .join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory, including the `DeckLink` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DeckLink"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("decklink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DeckLink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Settings-backed slot store ────────────────────────────────────────────────

/// [`SlotStore`] that writes every assignment back to the config file.
pub struct SettingsSlotStore {
    config: AppConfig,
    table: SlotTable,
    path: Option<PathBuf>,
}

impl SettingsSlotStore {
    /// `path` of `None` keeps assignments in memory only.
    pub fn new(config: AppConfig, path: Option<PathBuf>) -> Self {
        let table = config.slot_table();
        Self {
            config,
            table,
            path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl SlotStore for SettingsSlotStore {
    fn get_descriptor(&self, slot: SlotId) -> ActionDescriptor {
        self.table.get(slot).clone()
    }

    fn set_descriptor(
        &mut self,
        slot: SlotId,
        descriptor: ActionDescriptor,
    ) -> Result<(), StoreError> {
        self.config
            .slots
            .insert(slot.to_string(), descriptor.to_settings());
        self.table.set(slot, descriptor);

        let Some(path) = &self.path else {
            return Ok(());
        };
        save_config_to(&self.config, path).map_err(|e| StoreError::Persist {
            slot,
            reason: e.to_string(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
