//! Wire frames exchanged with the deck.
//!
//! The link is line-oriented ASCII at 9600 baud, 8N1:
//!
//! | Direction     | Frame     | Meaning                              |
//! |---------------|-----------|--------------------------------------|
//! | host → device | `TEST\n`  | identification probe                 |
//! | device → host | `DECK\n`  | identification acknowledgment        |
//! | host → device | `PING\n`  | liveness probe                       |
//! | device → host | `PONG\n`  | liveness acknowledgment (optional)   |
//! | device → host | `A\n`..`H\n` | button press on that slot         |

use crate::domain::slot::SlotId;

/// Identification probe.
pub const IDENTIFY_PROBE: &str = "TEST";
/// The only valid reply to [`IDENTIFY_PROBE`].
pub const IDENTIFY_ACK: &str = "DECK";
/// Liveness probe.
pub const LIVENESS_PROBE: &str = "PING";
/// Liveness reply.  Any inbound traffic counts as liveness; this one carries
/// no other meaning.
pub const LIVENESS_ACK: &str = "PONG";

/// Frame terminator.
pub const FRAME_TERMINATOR: u8 = b'\n';

/// Serial line speed expected by the deck firmware.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Encodes an outbound frame: the ASCII payload followed by `\n`.
pub fn encode_frame(payload: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 1);
    bytes.extend_from_slice(payload.as_bytes());
    bytes.push(FRAME_TERMINATOR);
    bytes
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// `PONG`.
    LivenessAck,
    /// `DECK`.
    IdentifyAck,
    /// A slot letter.
    ButtonPress(SlotId),
    /// Anything else, kept for logging.
    Unknown(String),
}

impl InboundFrame {
    /// Classifies one line of device output.
    ///
    /// The line is trimmed first.  Returns `None` for blank lines, which carry
    /// no frame.  Matching is exact and case-sensitive, checked in the order
    /// `PONG`, `DECK`, slot id.
    pub fn classify(line: &str) -> Option<InboundFrame> {
        let frame = line.trim();
        if frame.is_empty() {
            return None;
        }
        let classified = match frame {
            LIVENESS_ACK => InboundFrame::LivenessAck,
            IDENTIFY_ACK => InboundFrame::IdentifyAck,
            other => match other.parse::<SlotId>() {
                Ok(slot) => InboundFrame::ButtonPress(slot),
                Err(_) => InboundFrame::Unknown(other.to_string()),
            },
        };
        Some(classified)
    }
}
