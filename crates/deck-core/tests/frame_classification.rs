//! Integration tests for the deck-core wire protocol.
//!
//! These tests feed raw serial bytes through the public API, exercising the
//! line decoder, frame classification and slot parsing together.

use deck_core::protocol::{encode_frame, IDENTIFY_PROBE, LIVENESS_PROBE};
use deck_core::{ActionDescriptor, InboundFrame, LineDecoder, SlotId, SlotTable};

/// Pushes `chunks` through a decoder and classifies every complete line.
fn classify_stream(chunks: &[&[u8]]) -> Vec<InboundFrame> {
    let mut decoder = LineDecoder::new();
    let mut frames = Vec::new();
    for chunk in chunks {
        decoder.push(chunk);
        while let Some(line) = decoder.next_line() {
            frames.extend(InboundFrame::classify(&line));
        }
    }
    frames
}

#[test]
fn test_handshake_reply_split_across_reads() {
    let frames = classify_stream(&[b"DE", b"CK\r", b"\n"]);
    assert_eq!(frames, vec![InboundFrame::IdentifyAck]);
}

#[test]
fn test_mixed_stream_classifies_in_order() {
    // Arrange
    let stream: &[&[u8]] = &[b"PONG\r\nA\r\n", b"\r\nnoise\r\nH\r\n"];

    // Act
    let frames = classify_stream(stream);

    // Assert
    assert_eq!(
        frames,
        vec![
            InboundFrame::LivenessAck,
            InboundFrame::ButtonPress(SlotId::A),
            InboundFrame::Unknown("noise".to_string()),
            InboundFrame::ButtonPress(SlotId::H),
        ]
    );
}

#[test]
fn test_button_frames_resolve_to_slot_descriptors() {
    // Arrange
    let mut table = SlotTable::default();
    let chord = ActionDescriptor::hotkey("ctrl+alt+f5").expect("valid chord");
    table.set(SlotId::C, chord.clone());

    // Act
    let resolved: Vec<&ActionDescriptor> = classify_stream(&[b"C\nZ\n"])
        .into_iter()
        .filter_map(|frame| match frame {
            InboundFrame::ButtonPress(slot) => Some(table.get(slot)),
            _ => None,
        })
        .collect();

    // Assert
    assert_eq!(resolved, vec![&chord]);
}

#[test]
fn test_probe_frames_are_newline_terminated_ascii() {
    for probe in [IDENTIFY_PROBE, LIVENESS_PROBE] {
        let bytes = encode_frame(probe);
        assert!(bytes.is_ascii());
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(bytes.len(), probe.len() + 1);
    }
}
