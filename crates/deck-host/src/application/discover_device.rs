//! DiscoverDeviceUseCase: finds the deck among the available serial ports.
//!
//! # How discovery works (for beginners)
//!
//! The deck is an ordinary USB-serial device, so nothing about the port name
//! says "this is the deck".  Discovery therefore asks every candidate:
//!
//! 1. Open the port at the configured baud rate.
//! 2. Wait for the settle interval.  Opening the port resets most
//!    microcontroller boards, and they ignore input while booting.
//! 3. Flush whatever the board printed while booting.
//! 4. Up to `handshake_attempts` times: write `TEST`, wait
//!    `handshake_timeout`, and look for the exact reply `DECK`.
//!
//! The first port that answers wins and its open link is handed back.  A
//! port that never answers is closed (dropped) before the next one is tried.
//! If the user configured a preferred port and it is present, it goes first.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use deck_core::domain::link::{DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF};
use deck_core::protocol::{DEFAULT_BAUD_RATE, IDENTIFY_PROBE};
use deck_core::InboundFrame;
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Discovery as a whole found nothing.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to enumerate serial ports: {0}")]
    Enumeration(String),
    #[error("no serial ports available")]
    NoPorts,
    #[error("no device answered the handshake ({candidates} ports tried)")]
    NoDevice { candidates: usize },
}

/// One candidate port did not turn out to be the deck.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: io::Error,
    },
    #[error("serial I/O error during handshake: {0}")]
    Io(#[from] io::Error),
    #[error("{port} did not acknowledge after {attempts} attempts")]
    NoAcknowledgment { port: String, attempts: u32 },
}

// ── Transport abstraction ────────────────────────────────────────────────────

/// One open, line-oriented serial link.
///
/// Dropping the link closes the port.
pub trait SerialLink: Send {
    /// Port name, e.g. `COM3` or `/dev/ttyACM0`.
    fn name(&self) -> &str;

    /// Writes `payload` followed by the frame terminator.
    fn write_frame(&mut self, payload: &str) -> io::Result<()>;

    /// Bytes available to read without blocking (zero when idle).
    fn bytes_to_read(&mut self) -> io::Result<usize>;

    /// Reads one newline-terminated line, without its terminator.
    ///
    /// Returns `Ok(None)` if no complete line arrived within `timeout`.
    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>>;

    /// Discards everything buffered in both directions.
    fn clear_buffers(&mut self) -> io::Result<()>;
}

/// Lists and opens serial ports.
pub trait PortEnumerator: Send + Sync {
    /// Port names in enumeration order.
    fn available_ports(&self) -> Result<Vec<String>, DiscoveryError>;

    /// Opens `port` at `baud_rate`, 8N1.
    fn open(&self, port: &str, baud_rate: u32) -> io::Result<Box<dyn SerialLink>>;
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// Timing and identity parameters for the device link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    /// Tried first when present in the enumeration.
    pub preferred_port: Option<String>,
    pub baud_rate: u32,
    /// Wait after opening a port before talking to it.
    pub settle: Duration,
    pub handshake_attempts: u32,
    /// Wait after each `TEST` before looking for `DECK`.
    pub handshake_timeout: Duration,
    /// Cadence of `PING` probes while connected.
    pub keepalive_interval: Duration,
    /// How long after a `PING` any inbound traffic counts as liveness.
    pub probe_window: Duration,
    /// Upper bound on one frame-receive pass.
    pub read_window: Duration,
    /// Per-read I/O timeout.
    pub io_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            preferred_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            settle: Duration::from_secs(2),
            handshake_attempts: 5,
            handshake_timeout: Duration::from_millis(500),
            keepalive_interval: Duration::from_secs(1),
            probe_window: Duration::from_millis(100),
            read_window: Duration::from_secs(1),
            io_timeout: Duration::from_secs(1),
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// The Discover Device use case.
pub struct Discovery {
    ports: Arc<dyn PortEnumerator>,
    settings: LinkSettings,
}

impl Discovery {
    pub fn new(ports: Arc<dyn PortEnumerator>, settings: LinkSettings) -> Self {
        Self { ports, settings }
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    /// Returns an open, verified link to the deck, or `None`.
    ///
    /// Never fails: every error is logged here.
    pub fn discover(&self) -> Option<Box<dyn SerialLink>> {
        match self.try_discover() {
            Ok(link) => Some(link),
            Err(e) => {
                info!("device not found: {e}");
                None
            }
        }
    }

    /// Like [`discover`](Self::discover), but reports why nothing was found.
    pub fn try_discover(&self) -> Result<Box<dyn SerialLink>, DiscoveryError> {
        let candidates = self.candidates()?;
        for port in &candidates {
            match self.try_port(port) {
                Ok(link) => {
                    info!(port = %port, "device acknowledged handshake");
                    return Ok(link);
                }
                Err(e) => warn!(port = %port, "candidate failed: {e}"),
            }
        }
        Err(DiscoveryError::NoDevice {
            candidates: candidates.len(),
        })
    }

    /// Enumerated ports, with the preferred one moved to the front.
    fn candidates(&self) -> Result<Vec<String>, DiscoveryError> {
        let mut ports = self.ports.available_ports()?;
        if ports.is_empty() {
            return Err(DiscoveryError::NoPorts);
        }
        if let Some(preferred) = &self.settings.preferred_port {
            if let Some(pos) = ports.iter().position(|p| p == preferred) {
                let port = ports.remove(pos);
                ports.insert(0, port);
            }
        }
        debug!(?ports, "discovery candidates");
        Ok(ports)
    }

    fn try_port(&self, port: &str) -> Result<Box<dyn SerialLink>, HandshakeError> {
        let mut link =
            self.ports
                .open(port, self.settings.baud_rate)
                .map_err(|source| HandshakeError::Open {
                    port: port.to_string(),
                    source,
                })?;

        thread::sleep(self.settings.settle);
        link.clear_buffers()?;

        handshake(link.as_mut(), &self.settings)?;
        Ok(link)
    }
}

/// Runs the `TEST`/`DECK` exchange on an open link.
///
/// # Errors
///
/// [`HandshakeError::NoAcknowledgment`] if no attempt saw `DECK`, or the
/// first I/O error.
pub fn handshake(link: &mut dyn SerialLink, settings: &LinkSettings) -> Result<(), HandshakeError> {
    for attempt in 1..=settings.handshake_attempts {
        link.write_frame(IDENTIFY_PROBE)?;
        thread::sleep(settings.handshake_timeout);

        if acknowledged(link, settings.io_timeout)? {
            debug!(port = link.name(), attempt, "handshake acknowledged");
            return Ok(());
        }

        debug!(port = link.name(), attempt, "no acknowledgment");
        if attempt < settings.handshake_attempts {
            thread::sleep(settings.handshake_timeout);
        }
    }

    Err(HandshakeError::NoAcknowledgment {
        port: link.name().to_string(),
        attempts: settings.handshake_attempts,
    })
}

/// Reads every buffered line; `true` if one of them is exactly `DECK`.
fn acknowledged(link: &mut dyn SerialLink, io_timeout: Duration) -> io::Result<bool> {
    let mut found = false;
    while link.bytes_to_read()? > 0 {
        let Some(line) = link.read_line(io_timeout)? else {
            break;
        };
        debug!(port = link.name(), frame = %line.trim(), "handshake frame");
        if InboundFrame::classify(&line) == Some(InboundFrame::IdentifyAck) {
            found = true;
        }
    }
    Ok(found)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::serial::mock::{MockDevice, MockPortEnumerator};

    fn fast_settings() -> LinkSettings {
        LinkSettings {
            settle: Duration::ZERO,
            handshake_timeout: Duration::ZERO,
            io_timeout: Duration::ZERO,
            ..LinkSettings::default()
        }
    }

    fn discovery(ports: &Arc<MockPortEnumerator>, settings: LinkSettings) -> Discovery {
        Discovery::new(Arc::clone(ports) as Arc<dyn PortEnumerator>, settings)
    }

    #[test]
    fn test_no_ports_yields_none() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());

        // Act
        let result = discovery(&ports, fast_settings()).try_discover();

        // Assert
        assert!(matches!(result, Err(DiscoveryError::NoPorts)));
    }

    #[test]
    fn test_first_deck_reply_connects_immediately() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());
        let deck = MockDevice::deck();
        ports.add_port("COM3", deck.clone());

        // Act
        let link = discovery(&ports, fast_settings()).discover();

        // Assert
        assert_eq!(link.map(|l| l.name().to_string()), Some("COM3".into()));
        assert_eq!(deck.written(), vec!["TEST".to_string()]);
        assert_eq!(deck.clear_count(), 1);
    }

    #[test]
    fn test_silent_port_is_skipped_after_all_attempts() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());
        let silent = MockDevice::silent();
        ports.add_port("COM1", silent.clone());
        ports.add_port("COM2", MockDevice::deck());

        // Act
        let link = discovery(&ports, fast_settings()).discover();

        // Assert
        assert_eq!(link.map(|l| l.name().to_string()), Some("COM2".into()));
        assert_eq!(silent.written().len(), 5);
        assert!(!silent.is_open(), "rejected candidate must be closed");
    }

    #[test]
    fn test_deck_on_last_allowed_attempt_connects() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());
        let late = MockDevice::silent();
        late.reply_on_attempt("TEST", 5, "DECK");
        ports.add_port("COM3", late.clone());

        // Act
        let link = discovery(&ports, fast_settings()).discover();

        // Assert
        assert_eq!(link.map(|l| l.name().to_string()), Some("COM3".into()));
        assert_eq!(late.written().len(), 5);
    }

    #[test]
    fn test_deck_after_attempts_run_out_is_rejected() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());
        let too_late = MockDevice::silent();
        too_late.reply_on_attempt("TEST", 6, "DECK");
        ports.add_port("COM3", too_late.clone());

        // Act
        let result = discovery(&ports, fast_settings()).try_discover();

        // Assert
        assert!(matches!(result, Err(DiscoveryError::NoDevice { .. })));
        assert_eq!(too_late.written(), vec!["TEST".to_string(); 5]);
        assert!(!too_late.is_open(), "rejected candidate must be closed");
    }

    #[test]
    fn test_reply_other_than_deck_is_rejected() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());
        let modem = MockDevice::silent();
        modem.reply_to("TEST", Some("OK"));
        ports.add_port("COM1", modem);

        // Act
        let result = discovery(&ports, fast_settings()).try_discover();

        // Assert
        assert!(matches!(result, Err(DiscoveryError::NoDevice { candidates: 1 })));
    }

    #[test]
    fn test_preferred_port_is_tried_first() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());
        let first = MockDevice::deck();
        let preferred = MockDevice::deck();
        ports.add_port("COM1", first.clone());
        ports.add_port("COM7", preferred.clone());
        let settings = LinkSettings {
            preferred_port: Some("COM7".into()),
            ..fast_settings()
        };

        // Act
        let link = discovery(&ports, settings).discover();

        // Assert
        assert_eq!(link.map(|l| l.name().to_string()), Some("COM7".into()));
        assert!(first.written().is_empty());
    }

    #[test]
    fn test_missing_preferred_port_falls_back_to_enumeration_order() {
        let ports = Arc::new(MockPortEnumerator::new());
        ports.add_port("COM1", MockDevice::deck());
        let settings = LinkSettings {
            preferred_port: Some("COM9".into()),
            ..fast_settings()
        };

        let link = discovery(&ports, settings).discover();

        assert_eq!(link.map(|l| l.name().to_string()), Some("COM1".into()));
    }

    #[test]
    fn test_open_failure_moves_to_next_candidate() {
        // Arrange
        let ports = Arc::new(MockPortEnumerator::new());
        ports.add_port("COM1", MockDevice::deck());
        ports.add_port("COM2", MockDevice::deck());
        ports.fail_open("COM1");

        // Act
        let link = discovery(&ports, fast_settings()).discover();

        // Assert
        assert_eq!(link.map(|l| l.name().to_string()), Some("COM2".into()));
    }

    #[test]
    fn test_deck_reply_after_boot_noise_is_accepted() {
        // Arrange: the board prints a banner before answering.
        let ports = Arc::new(MockPortEnumerator::new());
        let deck = MockDevice::silent();
        deck.reply_to("TEST", Some("DECK"));
        deck.push_on_next_write("booting v1.2");
        ports.add_port("COM1", deck);

        // Act
        let link = discovery(&ports, fast_settings()).discover();

        // Assert
        assert!(link.is_some());
    }
}
