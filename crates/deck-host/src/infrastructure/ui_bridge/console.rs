//! Headless [`UiSurface`]: prints to standard output.

use std::io::Write;

use deck_core::{ConnectionState, SlotId};

use super::UiSurface;
use crate::application::capture_hotkey::CapturedHotkey;

/// Writes every UI update as one line.
pub struct ConsoleSurface<W: Write> {
    out: W,
}

impl ConsoleSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // A closed stdout only loses the message.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write> UiSurface for ConsoleSurface<W> {
    fn on_status_changed(&mut self, state: ConnectionState) {
        self.line(&format!("[deck] {state}"));
    }

    fn on_capture_display_changed(&mut self, slot: SlotId, display: &str) {
        self.line(&format!("[record {slot}] {display}"));
    }

    fn on_capture_finished(&mut self, captured: &CapturedHotkey) {
        self.line(&format!(
            "[record {}] saved hotkey:{}",
            captured.slot, captured.combination
        ));
    }

    fn on_notice(&mut self, notice: &str) {
        self.line(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_are_written_one_per_line() {
        // Arrange
        let mut surface = ConsoleSurface::new(Vec::new());

        // Act
        surface.on_status_changed(ConnectionState::Connecting);
        surface.on_capture_display_changed(SlotId::B, "ctrl+a");
        surface.on_capture_finished(&CapturedHotkey {
            slot: SlotId::B,
            combination: "ctrl+a".into(),
        });

        // Assert
        let text = String::from_utf8(surface.into_inner()).unwrap();
        assert_eq!(
            text,
            "[deck] waiting\n[record B] ctrl+a\n[record B] saved hotkey:ctrl+a\n"
        );
    }
}
