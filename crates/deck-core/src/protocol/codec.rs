//! Byte stream → newline-delimited frame decoder.
//!
//! Serial reads return whatever bytes have arrived, which may be half a frame
//! or several frames at once.  [`LineDecoder`] buffers the bytes and hands out
//! complete lines.

use tracing::warn;

use super::frame::FRAME_TERMINATOR;

/// Longest line kept before the buffer is discarded as garbage.
///
/// Real frames are at most four bytes; line noise on an unrelated device can
/// produce arbitrarily long runs without a newline.
pub const MAX_LINE_LENGTH: usize = 256;

/// Incremental line splitter.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly read bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() > MAX_LINE_LENGTH && !self.buffer.contains(&FRAME_TERMINATOR) {
            warn!(
                len = self.buffer.len(),
                "discarding unterminated input longer than {MAX_LINE_LENGTH} bytes"
            );
            self.buffer.clear();
        }
    }

    /// Removes and returns the next complete line, without its terminator.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; classification treats
    /// such lines as unknown frames.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == FRAME_TERMINATOR)?;
        let line: Vec<u8> = self.buffer.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line[..end]).into_owned())
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drops any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_frame_waits_for_terminator() {
        // Arrange
        let mut decoder = LineDecoder::new();

        // Act
        decoder.push(b"DE");
        let first = decoder.next_line();
        decoder.push(b"CK\n");
        let second = decoder.next_line();

        // Assert
        assert_eq!(first, None);
        assert_eq!(second.as_deref(), Some("DECK"));
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_several_frames_in_one_read() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"A\r\nPONG\nB");

        assert_eq!(decoder.next_line().as_deref(), Some("A\r"));
        assert_eq!(decoder.next_line().as_deref(), Some("PONG"));
        assert_eq!(decoder.next_line(), None);
        assert_eq!(decoder.pending(), 1);
    }

    #[test]
    fn test_overlong_garbage_is_discarded() {
        let mut decoder = LineDecoder::new();
        decoder.push(&[b'x'; MAX_LINE_LENGTH + 1]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut decoder = LineDecoder::new();
        decoder.push(&[0xFF, b'A', b'\n']);
        assert_eq!(decoder.next_line().as_deref(), Some("\u{FFFD}A"));
    }
}
