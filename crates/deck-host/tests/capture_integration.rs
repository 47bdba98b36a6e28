//! Integration tests for hotkey capture.
//!
//! The mock hook stands in for the OS hook thread: edges go through the
//! real UI queue and are handled by the controller, and the captured chord
//! is saved to a config file on disk.

use std::path::PathBuf;
use std::sync::Arc;

use deck_core::{ActionDescriptor, SlotId};
use deck_host::application::{
    capture_hotkey::{CaptureError, CaptureUpdate, HotkeyCapture, KeyEdge, KeyboardHook},
    dispatch::CommandDispatcher,
    execute_action::ActionExecutor,
};
use deck_host::infrastructure::{
    input_emulation::mock::MockInputEmulator,
    keyboard_hook::mock::MockKeyboardHook,
    storage::config::{load_config_from, AppConfig, SettingsSlotStore},
    ui_bridge::{console::ConsoleSurface, ui_queue, UiCommand, UiController, UiTask},
};

fn temp_config_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("deck-host-capture-{}-{name}", std::process::id()))
        .join("config.toml")
}

#[test]
fn test_ctrl_shift_a_released_in_any_order_yields_canonical_chord() {
    // Arrange
    let hook = Arc::new(MockKeyboardHook::new());
    let mut capture = HotkeyCapture::new(hook.clone());
    capture.start(SlotId::A, Box::new(|_| {})).unwrap();

    // Act
    let mut last = None;
    for edge in [
        KeyEdge::down("ctrl"),
        KeyEdge::down("shift"),
        KeyEdge::down("a"),
        KeyEdge::up("shift"),
        KeyEdge::up("a"),
        KeyEdge::up("ctrl"),
    ] {
        last = Some(capture.handle_edge(&edge).unwrap());
    }

    // Assert
    match last {
        Some(CaptureUpdate::Finished(captured)) => {
            assert_eq!(captured.slot, SlotId::A);
            assert_eq!(captured.combination, "ctrl+shift+a");
        }
        other => panic!("expected a finished capture, got {other:?}"),
    }
    assert!(!capture.is_recording());
    assert!(!hook.is_exclusive());
}

#[test]
fn test_right_side_modifiers_fold_to_canonical_names() {
    let hook = Arc::new(MockKeyboardHook::new());
    let mut capture = HotkeyCapture::new(hook);
    capture.start(SlotId::B, Box::new(|_| {})).unwrap();

    capture.handle_edge(&KeyEdge::down("right ctrl")).unwrap();
    capture.handle_edge(&KeyEdge::down("alt gr")).unwrap();
    let update = capture.handle_edge(&KeyEdge::down("k")).unwrap();

    assert_eq!(update, CaptureUpdate::DisplayChanged("alt+ctrl+k".into()));
}

#[test]
fn test_right_side_variants_keep_press_order_when_already_canonical() {
    let hook = Arc::new(MockKeyboardHook::new());
    let mut capture = HotkeyCapture::new(hook);
    capture.start(SlotId::B, Box::new(|_| {})).unwrap();

    capture.handle_edge(&KeyEdge::down("right ctrl")).unwrap();
    capture.handle_edge(&KeyEdge::down("right shift")).unwrap();
    let update = capture.handle_edge(&KeyEdge::down("k")).unwrap();

    assert_eq!(update, CaptureUpdate::DisplayChanged("ctrl+shift+k".into()));
}

#[test]
fn test_failed_release_on_stop_still_ends_session() {
    // Arrange
    let hook = Arc::new(MockKeyboardHook::new());
    let mut capture = HotkeyCapture::new(hook.clone());
    capture.start(SlotId::C, Box::new(|_| {})).unwrap();
    hook.fail_next_release();

    // Act
    let result = capture.stop();

    // Assert
    assert!(matches!(result, Err(CaptureError::HookRelease(_))));
    assert!(!capture.is_recording());
    assert_eq!(hook.release_count(), 1);
}

#[test]
fn test_recorded_hotkey_is_saved_to_config_file() {
    // Arrange
    let path = temp_config_path("save");
    let _ = std::fs::remove_file(&path);
    let hook = Arc::new(MockKeyboardHook::new());
    let (handle, queue) = ui_queue();
    let dispatcher = CommandDispatcher::new(
        Box::new(SettingsSlotStore::new(AppConfig::default(), Some(path.clone()))),
        ActionExecutor::new(Arc::new(MockInputEmulator::new())),
    );
    let mut controller = UiController::new(
        dispatcher,
        HotkeyCapture::new(hook.clone()),
        Box::new(ConsoleSurface::new(std::io::sink())),
        handle.clone(),
    );

    // Act
    handle.post(UiTask::Command(UiCommand::Record(SlotId::G)));
    controller.tick(&queue);
    for edge in [
        KeyEdge::down("windows"),
        KeyEdge::down("f9"),
        KeyEdge::up("f9"),
        KeyEdge::up("windows"),
    ] {
        assert!(hook.emit(edge), "hook must be held while recording");
    }
    controller.tick(&queue);

    // Assert
    let expected = ActionDescriptor::hotkey("windows+f9").unwrap();
    assert!(!controller.is_recording());
    assert_eq!(controller.descriptor(SlotId::G), expected);
    let saved = load_config_from(&path).unwrap();
    assert_eq!(saved.slot_table().get(SlotId::G), &expected);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_second_record_request_while_recording_is_refused() {
    let hook = Arc::new(MockKeyboardHook::new());
    let mut capture = HotkeyCapture::new(hook.clone());
    capture.start(SlotId::A, Box::new(|_| {})).unwrap();

    let second = capture.start(SlotId::B, Box::new(|_| {}));

    assert!(matches!(second, Err(CaptureError::AlreadyRecording)));
    assert_eq!(capture.target(), Some(SlotId::A));
    assert_eq!(hook.acquire_count(), 1);
}
