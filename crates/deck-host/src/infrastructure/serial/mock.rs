//! Scripted serial transport for tests.
//!
//! # Why a mock transport?
//!
//! Discovery and the supervisor talk to a real microcontroller over USB.
//! Tests cannot rely on one being plugged in, and even if one were, they
//! could not make it stop answering on cue.
//!
//! A [`MockDevice`] plays the board: it records every frame the host writes
//! and answers probes from a reply table.  Clones share state, so a test
//! keeps one clone to script and inspect the device while the code under
//! test owns a [`MockSerialLink`] opened on it.
//!
//! ```ignore
//! let device = MockDevice::deck();          // answers TEST and PING
//! ports.add_port("COM3", device.clone());
//!
//! // ... discovery connects ...
//!
//! device.go_silent();                        // now ignores every probe
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use deck_core::protocol::{IDENTIFY_ACK, IDENTIFY_PROBE, LIVENESS_ACK, LIVENESS_PROBE};

use crate::application::discover_device::{DiscoveryError, PortEnumerator, SerialLink};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct DeviceState {
    replies: HashMap<String, String>,
    /// Probe → (write number, reply) answered only on that write.
    attempt_replies: HashMap<String, (usize, String)>,
    probe_counts: HashMap<String, usize>,
    inbound: VecDeque<String>,
    on_next_write: Vec<String>,
    written: Vec<String>,
    clear_count: usize,
    connected: bool,
    open_links: usize,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            replies: HashMap::new(),
            attempt_replies: HashMap::new(),
            probe_counts: HashMap::new(),
            inbound: VecDeque::new(),
            on_next_write: Vec::new(),
            written: Vec::new(),
            clear_count: 0,
            connected: true,
            open_links: 0,
        }
    }
}

/// A simulated deck (or any other serial device).
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    /// A device that never answers anything.
    pub fn silent() -> Self {
        Self::default()
    }

    /// A well-behaved deck: `TEST` → `DECK`, `PING` → `PONG`.
    pub fn deck() -> Self {
        let device = Self::silent();
        device.reply_to(IDENTIFY_PROBE, Some(IDENTIFY_ACK));
        device.reply_to(LIVENESS_PROBE, Some(LIVENESS_ACK));
        device
    }

    /// Sets (or with `None`, removes) the reply line sent after `probe`.
    pub fn reply_to(&self, probe: &str, reply: Option<&str>) {
        let mut state = lock(&self.state);
        match reply {
            Some(reply) => state.replies.insert(probe.to_string(), reply.to_string()),
            None => state.replies.remove(probe),
        };
    }

    /// Answers `probe` with `reply` only on its `attempt`-th write
    /// (1-based), counted since the device was created.
    pub fn reply_on_attempt(&self, probe: &str, attempt: usize, reply: &str) {
        lock(&self.state)
            .attempt_replies
            .insert(probe.to_string(), (attempt, reply.to_string()));
    }

    /// Stops answering every probe.  The port stays open.
    pub fn go_silent(&self) {
        let mut state = lock(&self.state);
        state.replies.clear();
        state.attempt_replies.clear();
    }

    /// Queues a line as if the device had sent it.
    pub fn push_inbound(&self, line: &str) {
        lock(&self.state).inbound.push_back(line.to_string());
    }

    /// Queues a line that the device sends right after the next write,
    /// ahead of any reply.
    pub fn push_on_next_write(&self, line: &str) {
        lock(&self.state).on_next_write.push(line.to_string());
    }

    /// Every frame the host has written, oldest first.
    pub fn written(&self) -> Vec<String> {
        lock(&self.state).written.clone()
    }

    pub fn clear_count(&self) -> usize {
        lock(&self.state).clear_count
    }

    /// Simulates unplugging: every further I/O call fails.
    pub fn disconnect(&self) {
        lock(&self.state).connected = false;
    }

    /// `true` while some link opened on this device has not been dropped.
    pub fn is_open(&self) -> bool {
        lock(&self.state).open_links > 0
    }

    /// Opens a link on this device.
    pub fn open_link(&self, name: &str) -> Box<dyn SerialLink> {
        lock(&self.state).open_links += 1;
        Box::new(MockSerialLink {
            name: name.to_string(),
            device: self.clone(),
        })
    }

    fn check_connected(state: &DeviceState) -> io::Result<()> {
        if state.connected {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"))
        }
    }
}

/// A link opened on a [`MockDevice`].  Dropping it closes the port.
#[derive(Debug)]
pub struct MockSerialLink {
    name: String,
    device: MockDevice,
}

impl SerialLink for MockSerialLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_frame(&mut self, payload: &str) -> io::Result<()> {
        let mut state = lock(&self.device.state);
        MockDevice::check_connected(&state)?;
        state.written.push(payload.to_string());
        let preamble = std::mem::take(&mut state.on_next_write);
        state.inbound.extend(preamble);
        if let Some(reply) = state.replies.get(payload).cloned() {
            state.inbound.push_back(reply);
        }
        let count = state.probe_counts.entry(payload.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        if let Some((attempt, reply)) = state.attempt_replies.get(payload).cloned() {
            if attempt == count {
                state.inbound.push_back(reply);
            }
        }
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        let state = lock(&self.device.state);
        MockDevice::check_connected(&state)?;
        Ok(state.inbound.iter().map(|line| line.len() + 1).sum())
    }

    fn read_line(&mut self, _timeout: Duration) -> io::Result<Option<String>> {
        let mut state = lock(&self.device.state);
        MockDevice::check_connected(&state)?;
        Ok(state.inbound.pop_front())
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        let mut state = lock(&self.device.state);
        MockDevice::check_connected(&state)?;
        state.inbound.clear();
        state.clear_count += 1;
        Ok(())
    }
}

impl Drop for MockSerialLink {
    fn drop(&mut self) {
        let mut state = lock(&self.device.state);
        state.open_links = state.open_links.saturating_sub(1);
    }
}

/// A scripted set of serial ports.
#[derive(Debug, Default)]
pub struct MockPortEnumerator {
    ports: Mutex<Vec<(String, MockDevice)>>,
    failing_opens: Mutex<HashSet<String>>,
    enumeration_error: Mutex<Option<String>>,
    open_counts: Mutex<HashMap<String, usize>>,
}

impl MockPortEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a port; enumeration order is insertion order.
    pub fn add_port(&self, name: &str, device: MockDevice) {
        lock(&self.ports).push((name.to_string(), device));
    }

    pub fn remove_port(&self, name: &str) {
        lock(&self.ports).retain(|(port, _)| port != name);
    }

    /// Opening `name` fails from now on.
    pub fn fail_open(&self, name: &str) {
        lock(&self.failing_opens).insert(name.to_string());
    }

    /// Enumeration fails with `message` from now on.
    pub fn fail_enumeration(&self, message: &str) {
        *lock(&self.enumeration_error) = Some(message.to_string());
    }

    /// How many times `name` has been opened successfully.
    pub fn open_count(&self, name: &str) -> usize {
        lock(&self.open_counts).get(name).copied().unwrap_or(0)
    }
}

impl PortEnumerator for MockPortEnumerator {
    fn available_ports(&self) -> Result<Vec<String>, DiscoveryError> {
        if let Some(message) = lock(&self.enumeration_error).clone() {
            return Err(DiscoveryError::Enumeration(message));
        }
        Ok(lock(&self.ports).iter().map(|(name, _)| name.clone()).collect())
    }

    fn open(&self, port: &str, _baud_rate: u32) -> io::Result<Box<dyn SerialLink>> {
        if lock(&self.failing_opens).contains(port) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{port} is in use"),
            ));
        }
        let device = lock(&self.ports)
            .iter()
            .find(|(name, _)| name == port)
            .map(|(_, device)| device.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{port} not found")))?;
        *lock(&self.open_counts).entry(port.to_string()).or_insert(0) += 1;
        Ok(device.open_link(port))
    }
}
