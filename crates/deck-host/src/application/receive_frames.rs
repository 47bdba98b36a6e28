//! ReceiveFramesUseCase: drains buffered device output into classified frames.
//!
//! One pass reads while the link reports buffered input, but never longer
//! than the read window.  Whatever is still buffered when the window closes
//! stays there for the next pass, so a chatty device cannot starve the
//! supervisor's keepalive cadence.

use std::io;
use std::time::{Duration, Instant};

use deck_core::{InboundFrame, SlotId};
use tracing::{debug, warn};

use super::discover_device::SerialLink;

/// Everything one receive pass observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedFrames {
    /// At least one non-blank frame arrived.  Any frame counts as liveness.
    pub traffic: bool,
    /// A `PONG` arrived.
    pub liveness_ack: bool,
    /// A `DECK` arrived.
    pub identify_ack: bool,
    /// Button presses in arrival order.
    pub presses: Vec<SlotId>,
    /// Number of frames that matched nothing.
    pub unknown: usize,
}

impl ReceivedFrames {
    fn record(&mut self, frame: InboundFrame) {
        self.traffic = true;
        match frame {
            InboundFrame::LivenessAck => self.liveness_ack = true,
            InboundFrame::IdentifyAck => self.identify_ack = true,
            InboundFrame::ButtonPress(slot) => self.presses.push(slot),
            InboundFrame::Unknown(text) => {
                warn!(frame = %text, "discarding unknown frame");
                self.unknown += 1;
            }
        }
    }
}

/// Reads and classifies frames for at most `read_window`.
///
/// At least one buffered line is read even when `read_window` is zero.
///
/// # Errors
///
/// The first I/O error from the link.  Frames read before it are lost; the
/// supervisor drops the link anyway.
pub fn receive_frames(
    link: &mut dyn SerialLink,
    read_window: Duration,
    io_timeout: Duration,
) -> io::Result<ReceivedFrames> {
    let deadline = Instant::now() + read_window;
    let mut received = ReceivedFrames::default();

    while link.bytes_to_read()? > 0 {
        let Some(line) = link.read_line(io_timeout)? else {
            break;
        };
        if let Some(frame) = InboundFrame::classify(&line) {
            debug!(port = link.name(), ?frame, "frame received");
            received.record(frame);
        }
        if Instant::now() >= deadline {
            break;
        }
    }

    Ok(received)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
