//! Native serial ports via the `serialport` crate.
//!
//! [`NativePortEnumerator`] lists the ports the OS knows about and opens them
//! 8N1 at the requested baud rate.  [`NativeSerialLink`] turns the raw byte
//! stream into lines with a [`LineDecoder`].

pub mod mock;

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use deck_core::protocol::encode_frame;
use deck_core::LineDecoder;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, SerialPortType, StopBits};
use tracing::debug;

use crate::application::discover_device::{DiscoveryError, PortEnumerator, SerialLink};

/// How often `read_line` polls an idle port while waiting for data.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Largest single read from the driver.
const READ_CHUNK: usize = 64;

/// A port as shown by `--list-ports`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescription {
    pub name: String,
    pub kind: String,
}

/// Enumerates and opens OS serial ports.
#[derive(Debug, Clone)]
pub struct NativePortEnumerator {
    io_timeout: Duration,
}

impl NativePortEnumerator {
    pub fn new(io_timeout: Duration) -> Self {
        Self { io_timeout }
    }

    /// Ports with a short description of the underlying hardware.
    pub fn describe_ports(&self) -> Result<Vec<PortDescription>, DiscoveryError> {
        let ports = serialport::available_ports()
            .map_err(|e| DiscoveryError::Enumeration(e.to_string()))?;
        Ok(ports
            .into_iter()
            .map(|info| PortDescription {
                kind: describe_port_type(&info.port_type),
                name: info.port_name,
            })
            .collect())
    }
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial");
            format!("{product} ({:04x}:{:04x})", usb.vid, usb.pid)
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

impl PortEnumerator for NativePortEnumerator {
    fn available_ports(&self) -> Result<Vec<String>, DiscoveryError> {
        Ok(self
            .describe_ports()?
            .into_iter()
            .map(|port| port.name)
            .collect())
    }

    fn open(&self, port: &str, baud_rate: u32) -> io::Result<Box<dyn SerialLink>> {
        let handle = serialport::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(self.io_timeout)
            .open()?;
        debug!(port, baud_rate, "serial port opened");
        Ok(Box::new(NativeSerialLink {
            name: port.to_string(),
            port: handle,
            decoder: LineDecoder::new(),
        }))
    }
}

/// An open OS serial port.  Dropping it closes the port.
pub struct NativeSerialLink {
    name: String,
    port: Box<dyn SerialPort>,
    decoder: LineDecoder,
}

impl NativeSerialLink {
    fn fill(&mut self, available: usize) -> io::Result<()> {
        let mut buf = [0u8; READ_CHUNK];
        let len = available.min(READ_CHUNK);
        match self.port.read(&mut buf[..len]) {
            Ok(n) => {
                self.decoder.push(&buf[..n]);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl SerialLink for NativeSerialLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_frame(&mut self, payload: &str) -> io::Result<()> {
        self.port.write_all(&encode_frame(payload))?;
        self.port.flush()
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        let driver = self.port.bytes_to_read()? as usize;
        Ok(driver + self.decoder.pending())
    }

    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.decoder.next_line() {
                return Ok(Some(line));
            }
            let available = self.port.bytes_to_read()? as usize;
            if available > 0 {
                self.fill(available)?;
                continue;
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(READ_POLL_INTERVAL.min(deadline - now));
        }
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::All)?;
        self.decoder.clear();
        Ok(())
    }
}
