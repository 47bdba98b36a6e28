//! Protocol module containing wire frames and the line decoder.

pub mod codec;
pub mod frame;

pub use codec::LineDecoder;
pub use frame::{
    encode_frame, InboundFrame, DEFAULT_BAUD_RATE, IDENTIFY_ACK, IDENTIFY_PROBE, LIVENESS_ACK,
    LIVENESS_PROBE,
};
