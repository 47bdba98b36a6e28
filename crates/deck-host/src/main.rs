//! DeckLink host application entry point.
//!
//! Wires together the device supervisor, the action executor, the hotkey
//! recorder and the console UI, then runs the UI loop on the main thread.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config_from()            -- TOML file, CLI overrides
//!  └─ ConnectionSupervisor::spawn() -- deck-supervisor thread
//!  └─ spawn_stdin_reader()          -- manual commands
//!  └─ UiController::run_until()     -- UI context (this thread)
//!       ├─ StatusChanged  -> console status line
//!       ├─ ButtonPressed  -> CommandDispatcher -> ActionExecutor
//!       ├─ KeyEdge        -> HotkeyCapture
//!       └─ Command        -> trigger / record / set / show
//! ```
//!
//! # Shutdown (for beginners)
//!
//! Ctrl+C or the `quit` command ends the UI loop.  The shared `running` flag
//! is then cleared, which the supervisor checks between sleeps, and the
//! supervisor thread is joined so the serial port is closed before exit.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use deck_host::application::{
    capture_hotkey::HotkeyCapture,
    discover_device::Discovery,
    dispatch::CommandDispatcher,
    execute_action::ActionExecutor,
    supervise_link::ConnectionSupervisor,
};
use deck_host::infrastructure::{
    input_emulation::native_emulator,
    keyboard_hook::native_keyboard_hook,
    serial::NativePortEnumerator,
    storage::config::{config_file_path, load_config_from, AppConfig, SettingsSlotStore},
    ui_bridge::{
        console::ConsoleSurface, ui_queue, UiCommand, UiController, UiHandle, UiTask,
        DEFAULT_UI_TICK,
    },
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// DeckLink host.
///
/// Finds the button deck on a serial port and turns its button presses into
/// keyboard, volume and media input.
#[derive(Debug, Parser)]
#[command(
    name = "deck-host",
    about = "Turns DeckLink button presses into keyboard and media input",
    version
)]
struct Cli {
    /// Path to the TOML config file.  Defaults to the platform config directory.
    #[arg(long, env = "DECK_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port to try first, e.g. `COM5` or `/dev/ttyACM0`.
    #[arg(long, env = "DECK_PORT")]
    port: Option<String>,

    /// Log level used when `RUST_LOG` is not set.  Overrides the config file.
    #[arg(long, env = "DECK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print the available serial ports and exit.
    #[arg(long)]
    list_ports: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => config_file_path().ok(),
    };
    let (mut config, load_error) = match config_path.as_deref().map(load_config_from) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (AppConfig::default(), Some(e)),
        None => (AppConfig::default(), None),
    };
    if let Some(port) = &cli.port {
        config.device.preferred_port = Some(port.clone());
    }

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise `--log-level`, then the config file.
    let fallback_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&fallback_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Some(e) = load_error {
        // Never overwrite a file we could not read.
        error!("{e}; using defaults and keeping assignments in memory");
        config_path = None;
    }

    let settings = config.to_link_settings();
    let ports = Arc::new(NativePortEnumerator::new(settings.io_timeout));

    if cli.list_ports {
        for port in ports.describe_ports()? {
            println!("{}\t{}", port.name, port.kind);
        }
        return Ok(());
    }

    match &config_path {
        Some(path) => info!(config = %path.display(), "DeckLink host starting"),
        None => warn!("no config file; slot assignments will not be saved"),
    }

    // ── Action execution ──────────────────────────────────────────────────────
    let emulator = native_emulator().context("input emulation unavailable")?;
    let store = SettingsSlotStore::new(config, config_path);
    let dispatcher = CommandDispatcher::new(Box::new(store), ActionExecutor::new(emulator));

    // ── Device supervisor ─────────────────────────────────────────────────────
    let (ui_handle, ui_queue) = ui_queue();
    let running = Arc::new(AtomicBool::new(true));

    let supervisor = ConnectionSupervisor::new(
        Discovery::new(ports, settings),
        Arc::new(ui_handle.clone()),
    );
    let device = supervisor.handle();
    let supervisor_thread = supervisor
        .spawn(Arc::clone(&running))
        .context("failed to start the device supervisor")?;

    spawn_stdin_reader(ui_handle.clone());

    // ── UI loop ───────────────────────────────────────────────────────────────
    let mut controller = UiController::new(
        dispatcher,
        HotkeyCapture::new(native_keyboard_hook()),
        Box::new(ConsoleSurface::stdout()),
        ui_handle,
    )
    .with_device_handle(device);

    info!("DeckLink host ready; type \"help\" for commands");
    controller
        .run_until(&ui_queue, DEFAULT_UI_TICK, async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("received Ctrl+C; shutting down"),
                Err(e) => {
                    error!("failed to listen for Ctrl+C signal: {e}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await;

    running.store(false, Ordering::Relaxed);
    if supervisor_thread.join().is_err() {
        error!("device supervisor panicked");
    }

    info!("DeckLink host stopped");
    Ok(())
}

/// Reads commands from stdin on a background thread.  End of input only
/// stops the reader; the host keeps running.
fn spawn_stdin_reader(handle: UiHandle) {
    let spawned = thread::Builder::new()
        .name("deck-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match UiCommand::parse(&line) {
                    Ok(command) => {
                        handle.post(UiTask::Command(command));
                    }
                    Err(e) => warn!("{e}"),
                }
            }
        });
    if let Err(e) = spawned {
        warn!("manual commands unavailable: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_leave_overrides_unset() {
        let cli = Cli::parse_from(["deck-host"]);

        assert!(cli.config.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.list_ports);
    }

    #[test]
    fn test_cli_accepts_port_and_log_level() {
        let cli = Cli::parse_from(["deck-host", "--port", "COM7", "--log-level", "debug"]);

        assert_eq!(cli.port.as_deref(), Some("COM7"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
