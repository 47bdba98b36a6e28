//! SuperviseLinkUseCase: keeps the device link alive for the process lifetime.
//!
//! # State machine
//!
//! ```text
//!                discover() ok
//!   Disconnected ─────────────► Connected
//!        ▲   │                      │
//!        │   │ discover() none      │ PING window silent and TEST unanswered,
//!        │   ▼                      │ or any I/O error
//!     Connecting ◄──(backoff)       │
//!        ▲                          │
//!        └──────────────────────────┘  (handle closed, backoff reset)
//! ```
//!
//! `Connecting` means "a backoff wait is in progress"; it behaves exactly
//! like `Disconnected` on the next step.
//!
//! # Threading
//!
//! The supervisor runs on its own thread (see [`ConnectionSupervisor::spawn`]).
//! The open link lives in a [`DeviceHandle`]; every read and write takes the
//! handle lock for that one operation only, and the lock is never held while
//! sleeping.  Status changes and button presses leave this thread only
//! through the [`LinkObserver`], which posts them to the UI context.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use deck_core::protocol::{IDENTIFY_PROBE, LIVENESS_PROBE};
use deck_core::{Backoff, ConnectionState, SlotId};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::discover_device::{Discovery, SerialLink};
use super::receive_frames::{receive_frames, ReceivedFrames};

/// How often a connected link is polled for frames.
pub const CONNECTED_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Longest single sleep in [`ConnectionSupervisor::run`] before the running
/// flag is checked again.
const SHUTDOWN_POLL_SLICE: Duration = Duration::from_millis(100);

/// The open transport, shared between the supervisor and readers of the
/// connection status.  `Some` exactly while the supervisor is `Connected`.
pub type DeviceHandle = Arc<Mutex<Option<Box<dyn SerialLink>>>>;

/// Reasons a connected link is given up.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("{port} answered neither PING nor TEST")]
    ProbeFailed { port: String },
    #[error("device handle is closed")]
    Closed,
}

/// Receives supervisor events.  Implementations must not block.
pub trait LinkObserver: Send + Sync {
    fn on_state_changed(&self, state: ConnectionState);
    fn on_button_pressed(&self, slot: SlotId);
}

fn lock_handle(handle: &DeviceHandle) -> MutexGuard<'_, Option<Box<dyn SerialLink>>> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Name of the port behind `handle`, if a link is open.
pub fn connected_port(handle: &DeviceHandle) -> Option<String> {
    lock_handle(handle).as_ref().map(|link| link.name().to_string())
}

/// The Connection Supervisor.
pub struct ConnectionSupervisor {
    discovery: Discovery,
    observer: Arc<dyn LinkObserver>,
    handle: DeviceHandle,
    state: ConnectionState,
    backoff: Backoff,
    last_keepalive: Option<Instant>,
    poll_interval: Duration,
}

impl ConnectionSupervisor {
    pub fn new(discovery: Discovery, observer: Arc<dyn LinkObserver>) -> Self {
        let settings = discovery.settings();
        let backoff = Backoff::new(settings.initial_backoff, settings.max_backoff);
        Self {
            discovery,
            observer,
            handle: Arc::new(Mutex::new(None)),
            state: ConnectionState::Disconnected,
            backoff,
            last_keepalive: None,
            poll_interval: CONNECTED_POLL_INTERVAL,
        }
    }

    /// Overrides how often a connected link is polled.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// A second reference to the device handle, for status queries.
    pub fn handle(&self) -> DeviceHandle {
        Arc::clone(&self.handle)
    }

    /// Runs one iteration and returns how long to wait before the next one.
    pub fn step(&mut self) -> Duration {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::Connecting => self.step_disconnected(),
            ConnectionState::Connected => self.step_connected(),
        }
    }

    /// Steps until `running` is cleared.
    pub fn run(mut self, running: Arc<AtomicBool>) {
        info!("device supervisor started");
        while running.load(Ordering::Relaxed) {
            let delay = self.step();
            sleep_while_running(delay, &running);
        }
        self.close_link();
        info!("device supervisor stopped");
    }

    /// Starts [`run`](Self::run) on a thread named `deck-supervisor`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created.
    pub fn spawn(self, running: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("deck-supervisor".to_string())
            .spawn(move || self.run(running))
    }

    // ── Disconnected ──────────────────────────────────────────────────────────

    fn step_disconnected(&mut self) -> Duration {
        match self.discovery.discover() {
            Some(link) => {
                info!(port = link.name(), "device connected");
                *lock_handle(&self.handle) = Some(link);
                self.backoff.reset();
                self.last_keepalive = Some(Instant::now());
                self.set_state(ConnectionState::Connected);
                self.poll_interval
            }
            None => {
                self.set_state(ConnectionState::Connecting);
                let delay = self.backoff.current();
                self.backoff.advance();
                debug!(?delay, "waiting before next discovery");
                delay
            }
        }
    }

    // ── Connected ─────────────────────────────────────────────────────────────

    fn step_connected(&mut self) -> Duration {
        match self.service_link() {
            Ok(()) => self.poll_interval,
            Err(e) => {
                warn!("device link lost: {e}");
                self.close_link();
                self.backoff.reset();
                self.set_state(ConnectionState::Disconnected);
                Duration::ZERO
            }
        }
    }

    fn service_link(&mut self) -> Result<(), LinkError> {
        let settings = self.discovery.settings();
        let (read_window, io_timeout) = (settings.read_window, settings.io_timeout);
        let received = self.with_link(|link| receive_frames(link, read_window, io_timeout))?;
        self.forward(&received);

        let keepalive_due = self
            .last_keepalive
            .map_or(true, |sent| sent.elapsed() >= self.discovery.settings().keepalive_interval);
        if keepalive_due {
            self.last_keepalive = Some(Instant::now());
            self.probe()?;
            self.backoff.reset();
        }
        Ok(())
    }

    /// `PING`, then any traffic within the probe window.  Escalates to
    /// `TEST`/`DECK` if the window stays silent.
    fn probe(&mut self) -> Result<(), LinkError> {
        let settings = self.discovery.settings().clone();

        self.with_link(|link| link.write_frame(LIVENESS_PROBE))?;
        thread::sleep(settings.probe_window);
        let received = self.with_link(|link| {
            receive_frames(link, settings.read_window, settings.io_timeout)
        })?;
        self.forward(&received);
        if received.traffic {
            return Ok(());
        }

        debug!("no traffic after PING; escalating to identification probe");
        self.with_link(|link| link.write_frame(IDENTIFY_PROBE))?;
        thread::sleep(settings.handshake_timeout);
        let received = self.with_link(|link| {
            receive_frames(link, settings.read_window, settings.io_timeout)
        })?;
        self.forward(&received);
        if received.identify_ack {
            return Ok(());
        }

        Err(LinkError::ProbeFailed {
            port: connected_port(&self.handle).unwrap_or_default(),
        })
    }

    fn forward(&self, received: &ReceivedFrames) {
        for &slot in &received.presses {
            self.observer.on_button_pressed(slot);
        }
    }

    /// Runs one I/O operation on the open link under the handle lock.
    fn with_link<T>(
        &self,
        op: impl FnOnce(&mut dyn SerialLink) -> io::Result<T>,
    ) -> Result<T, LinkError> {
        let mut guard = lock_handle(&self.handle);
        let link = guard.as_mut().ok_or(LinkError::Closed)?;
        Ok(op(link.as_mut())?)
    }

    fn close_link(&mut self) {
        if let Some(link) = lock_handle(&self.handle).take() {
            debug!(port = link.name(), "closing device link");
        }
        self.last_keepalive = None;
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        info!(from = %self.state, to = %state, "connection state changed");
        self.state = state;
        self.observer.on_state_changed(state);
    }
}

fn sleep_while_running(delay: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + delay;
    loop {
        let now = Instant::now();
        if now >= deadline || !running.load(Ordering::Relaxed) {
            return;
        }
        thread::sleep(SHUTDOWN_POLL_SLICE.min(deadline - now));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
