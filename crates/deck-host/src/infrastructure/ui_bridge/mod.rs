//! Bridge between the background threads and the UI context.
//!
//! # Why a task queue? (for beginners)
//!
//! Three threads produce events the user should see or that must cause OS
//! input: the device supervisor (status changes, button presses), the
//! keyboard hook (key edges while recording a hotkey) and the stdin reader
//! (manual commands).  Only the UI context may touch UI state or inject
//! input, so none of those threads act directly.  They post a [`UiTask`]
//! into a bounded queue instead:
//!
//! ```text
//! deck-supervisor ──┐
//! deck-capture-hook ┼──► UiHandle::post ──► [ queue, 256 ] ──► UiController::tick
//! stdin reader ─────┘        (try_send)                          (UI context)
//! ```
//!
//! [`UiController`] drains the queue once per tick and handles every task in
//! order.  Posting never blocks: if the UI context falls hopelessly behind,
//! tasks are dropped with a warning rather than stalling the hook callback.

pub mod console;

use std::future::Future;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::time::Duration;

use deck_core::{ActionDescriptor, ConnectionState, SlotId};
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::application::capture_hotkey::{
    CaptureUpdate, CapturedHotkey, EdgeSink, HotkeyCapture, KeyEdge,
};
use crate::application::dispatch::{CommandDispatcher, DispatchOutcome};
use crate::application::supervise_link::{connected_port, DeviceHandle, LinkObserver};

/// Capacity of the UI task queue.
pub const UI_QUEUE_CAPACITY: usize = 256;

/// Default UI tick.
pub const DEFAULT_UI_TICK: Duration = Duration::from_millis(20);

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returned when a command line cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised command {0:?} (try \"help\")")]
pub struct UiCommandError(pub String);

/// A manual request from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Run a slot's action as if its button had been pressed.
    Trigger(SlotId),
    /// Start recording a hotkey for a slot.
    Record(SlotId),
    /// Stop recording and keep whatever was captured.
    StopRecording,
    /// Assign a legacy action string to a slot.
    Assign(SlotId, String),
    /// Print the connection status and every slot's action.
    Show,
    Help,
    Quit,
}

impl UiCommand {
    /// Parses one command line.
    ///
    /// ```text
    /// A | press A        trigger slot A
    /// record A           record a hotkey for slot A
    /// stop               stop recording
    /// set A <action>     e.g. "set B press:f16", "set C hotkey:ctrl+c"
    /// show               status and slot table
    /// help | quit
    /// ```
    pub fn parse(line: &str) -> Result<UiCommand, UiCommandError> {
        let line = line.trim();
        let err = || UiCommandError(line.to_string());
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let slot = |arg: &str| arg.to_uppercase().parse::<SlotId>().map_err(|_| err());

        match verb.to_lowercase().as_str() {
            "press" | "test" => slot(rest).map(UiCommand::Trigger),
            "record" => slot(rest).map(UiCommand::Record),
            "stop" if rest.is_empty() => Ok(UiCommand::StopRecording),
            "show" | "status" if rest.is_empty() => Ok(UiCommand::Show),
            "help" if rest.is_empty() => Ok(UiCommand::Help),
            "quit" | "exit" if rest.is_empty() => Ok(UiCommand::Quit),
            "set" => {
                let (id, action) = rest.split_once(char::is_whitespace).ok_or_else(err)?;
                Ok(UiCommand::Assign(slot(id)?, action.trim().to_string()))
            }
            _ if rest.is_empty() => slot(verb).map(UiCommand::Trigger),
            _ => Err(err()),
        }
    }
}

const HELP_TEXT: &[&str] = &[
    "A..H | press <slot>    run a slot's action",
    "record <slot>          record a hotkey for a slot",
    "stop                   stop recording",
    "set <slot> <action>    text, press:<key>, hotkey:<keys>, volume:<dir>, media:<cmd>",
    "show                   connection status and slot actions",
    "quit",
];

// ── Queue ─────────────────────────────────────────────────────────────────────

/// Work scheduled onto the UI context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiTask {
    StatusChanged(ConnectionState),
    ButtonPressed(SlotId),
    KeyEdge(KeyEdge),
    Command(UiCommand),
}

/// Producer side of the UI queue.  Cheap to clone; one per producer thread.
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: SyncSender<UiTask>,
}

/// Consumer side of the UI queue, owned by the UI context.
#[derive(Debug)]
pub struct UiQueue {
    rx: Receiver<UiTask>,
}

/// Creates a bounded UI queue.
pub fn ui_queue() -> (UiHandle, UiQueue) {
    let (tx, rx) = mpsc::sync_channel(UI_QUEUE_CAPACITY);
    (UiHandle { tx }, UiQueue { rx })
}

impl UiHandle {
    /// Schedules `task` without blocking.  Returns `false` if it was dropped.
    pub fn post(&self, task: UiTask) -> bool {
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(task)) => {
                warn!(?task, "UI queue full; dropping task");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// A keyboard-hook sink that posts every edge to the UI context.
    pub fn edge_sink(&self) -> EdgeSink {
        let handle = self.clone();
        Box::new(move |edge| {
            handle.post(UiTask::KeyEdge(edge));
        })
    }
}

impl LinkObserver for UiHandle {
    fn on_state_changed(&self, state: ConnectionState) {
        self.post(UiTask::StatusChanged(state));
    }

    fn on_button_pressed(&self, slot: SlotId) {
        self.post(UiTask::ButtonPressed(slot));
    }
}

impl UiQueue {
    /// Takes every task queued so far, at most one queue's worth.
    pub fn drain(&self) -> Vec<UiTask> {
        self.rx.try_iter().take(UI_QUEUE_CAPACITY).collect()
    }
}

// ── Surface ───────────────────────────────────────────────────────────────────

/// What the user sees.  Called only on the UI context.
pub trait UiSurface {
    fn on_status_changed(&mut self, state: ConnectionState);

    /// The live hotkey display for `slot` changed.
    fn on_capture_display_changed(&mut self, slot: SlotId, display: &str);

    /// A capture ended and its combination was assigned.
    fn on_capture_finished(&mut self, captured: &CapturedHotkey);

    /// A transient message: failures, command output.
    fn on_notice(&mut self, notice: &str);
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Owns every piece of UI-context state: the dispatcher, the hotkey
/// recorder and the surface.
pub struct UiController {
    dispatcher: CommandDispatcher,
    capture: HotkeyCapture,
    surface: Box<dyn UiSurface>,
    handle: UiHandle,
    device: Option<DeviceHandle>,
    status: ConnectionState,
    quit_requested: bool,
}

impl UiController {
    /// `handle` must feed the queue this controller drains; capture sessions
    /// post their key edges through it.
    pub fn new(
        dispatcher: CommandDispatcher,
        capture: HotkeyCapture,
        surface: Box<dyn UiSurface>,
        handle: UiHandle,
    ) -> Self {
        Self {
            dispatcher,
            capture,
            surface,
            handle,
            device: None,
            status: ConnectionState::Disconnected,
            quit_requested: false,
        }
    }

    /// Lets `show` report which port the deck is on.
    pub fn with_device_handle(mut self, device: DeviceHandle) -> Self {
        self.device = Some(device);
        self
    }

    pub fn status(&self) -> ConnectionState {
        self.status
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn descriptor(&self, slot: SlotId) -> ActionDescriptor {
        self.dispatcher.descriptor(slot)
    }

    /// Handles every queued task.  Returns the number handled.
    pub fn tick(&mut self, queue: &UiQueue) -> usize {
        let tasks = queue.drain();
        let count = tasks.len();
        for task in tasks {
            self.handle(task);
        }
        count
    }

    pub fn handle(&mut self, task: UiTask) {
        match task {
            UiTask::StatusChanged(state) => {
                self.status = state;
                self.surface.on_status_changed(state);
            }
            UiTask::ButtonPressed(slot) => self.request_dispatch(slot),
            UiTask::KeyEdge(edge) => self.handle_key_edge(&edge),
            UiTask::Command(command) => self.handle_command(command),
        }
    }

    fn handle_command(&mut self, command: UiCommand) {
        match command {
            UiCommand::Trigger(slot) => self.request_dispatch(slot),
            UiCommand::Record(slot) => self.start_capture(slot),
            UiCommand::StopRecording => self.stop_capture(),
            UiCommand::Assign(slot, action) => self.assign_legacy(slot, &action),
            UiCommand::Show => self.show(),
            UiCommand::Help => {
                for line in HELP_TEXT {
                    self.surface.on_notice(line);
                }
            }
            UiCommand::Quit => self.quit_requested = true,
        }
    }

    /// Runs `slot`'s action through the shared dispatcher.
    pub fn request_dispatch(&mut self, slot: SlotId) {
        match self.dispatcher.dispatch(slot) {
            Ok(DispatchOutcome::Executed(slot)) => debug!(%slot, "action executed"),
            Ok(_) => {}
            Err(e) => {
                error!(%slot, "action failed: {e}");
                self.surface.on_notice(&format!("button {slot}: {e}"));
            }
        }
    }

    pub fn start_capture(&mut self, slot: SlotId) {
        match self.capture.start(slot, self.handle.edge_sink()) {
            Ok(placeholder) => self.surface.on_capture_display_changed(slot, placeholder),
            Err(e) => self.surface.on_notice(&format!("cannot record hotkey: {e}")),
        }
    }

    pub fn stop_capture(&mut self) {
        match self.capture.stop() {
            Ok(captured) => self.complete_capture(captured),
            Err(e) => self.surface.on_notice(&format!("cannot stop recording: {e}")),
        }
    }

    fn handle_key_edge(&mut self, edge: &KeyEdge) {
        let slot = self.capture.target();
        match self.capture.handle_edge(edge) {
            Ok(CaptureUpdate::DisplayChanged(display)) => {
                if let Some(slot) = slot {
                    self.surface.on_capture_display_changed(slot, &display);
                }
            }
            Ok(CaptureUpdate::Finished(captured)) => self.complete_capture(captured),
            Ok(CaptureUpdate::Ignored) => {}
            Err(e) => self.surface.on_notice(&format!("hotkey capture: {e}")),
        }
    }

    /// Writes a captured combination into the slot it was recorded for.
    fn complete_capture(&mut self, captured: CapturedHotkey) {
        if captured.combination.is_empty() {
            self.surface
                .on_notice(&format!("no keys recorded for button {}", captured.slot));
            return;
        }
        let descriptor = match ActionDescriptor::hotkey(&captured.combination) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(combination = %captured.combination, "captured combination rejected: {e}");
                self.surface.on_notice(&format!("cannot use {}: {e}", captured.combination));
                return;
            }
        };
        match self.dispatcher.assign(captured.slot, descriptor) {
            Ok(()) => {
                info!(slot = %captured.slot, combination = %captured.combination, "hotkey assigned")
            }
            Err(e) => {
                error!("failed to save captured hotkey: {e}");
                self.surface.on_notice(&e.to_string());
            }
        }
        self.surface.on_capture_finished(&captured);
    }

    fn assign_legacy(&mut self, slot: SlotId, action: &str) {
        let descriptor = match ActionDescriptor::parse_legacy(action) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                self.surface.on_notice(&format!("invalid action for {slot}: {e}"));
                return;
            }
        };
        match self.dispatcher.assign(slot, descriptor) {
            Ok(()) => self.surface.on_notice(&format!("{slot}: {}", self.dispatcher.descriptor(slot))),
            Err(e) => self.surface.on_notice(&e.to_string()),
        }
    }

    fn show(&mut self) {
        let port = self.device.as_ref().and_then(connected_port);
        let status = match port {
            Some(port) => format!("status: {} ({port})", self.status),
            None => format!("status: {}", self.status),
        };
        self.surface.on_notice(&status);
        for slot in SlotId::ALL {
            let line = format!("{slot}: {}", self.dispatcher.descriptor(slot));
            self.surface.on_notice(&line);
        }
    }

    /// Ticks every `tick` until `shutdown` resolves or a `quit` command
    /// arrives.  A capture still in progress is stopped on the way out.
    pub async fn run_until<F>(&mut self, queue: &UiQueue, tick: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick(queue);
                    if self.quit_requested {
                        break;
                    }
                }
            }
        }

        if self.capture.is_recording() {
            if let Err(e) = self.capture.stop() {
                error!("failed to stop hotkey capture on shutdown: {e}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use deck_core::SlotTable;

    use super::*;
    use crate::application::execute_action::ActionExecutor;
    use crate::infrastructure::input_emulation::mock::{EmulatedEvent, MockInputEmulator};
    use crate::infrastructure::keyboard_hook::mock::MockKeyboardHook;

    #[derive(Clone, Default)]
    struct RecordingSurface(Arc<Mutex<Vec<String>>>);

    impl RecordingSurface {
        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl UiSurface for RecordingSurface {
        fn on_status_changed(&mut self, state: ConnectionState) {
            self.0.lock().unwrap().push(format!("status {state}"));
        }
        fn on_capture_display_changed(&mut self, slot: SlotId, display: &str) {
            self.0.lock().unwrap().push(format!("display {slot} {display}"));
        }
        fn on_capture_finished(&mut self, captured: &CapturedHotkey) {
            self.0
                .lock()
                .unwrap()
                .push(format!("finished {} {}", captured.slot, captured.combination));
        }
        fn on_notice(&mut self, notice: &str) {
            self.0.lock().unwrap().push(notice.to_string());
        }
    }

    struct Fixture {
        controller: UiController,
        handle: UiHandle,
        queue: UiQueue,
        emulator: Arc<MockInputEmulator>,
        hook: Arc<MockKeyboardHook>,
        surface: RecordingSurface,
    }

    fn fixture() -> Fixture {
        let emulator = Arc::new(MockInputEmulator::new());
        let hook = Arc::new(MockKeyboardHook::new());
        let surface = RecordingSurface::default();
        let (handle, queue) = ui_queue();
        let dispatcher = CommandDispatcher::new(
            Box::new(SlotTable::default()),
            ActionExecutor::new(emulator.clone()).with_key_hold(Duration::ZERO),
        );
        let controller = UiController::new(
            dispatcher,
            HotkeyCapture::new(hook.clone()),
            Box::new(surface.clone()),
            handle.clone(),
        );
        Fixture {
            controller,
            handle,
            queue,
            emulator,
            hook,
            surface,
        }
    }

    #[test]
    fn test_button_press_runs_assigned_action() {
        // Arrange
        let mut f = fixture();
        f.controller
            .handle(UiTask::Command(UiCommand::Assign(SlotId::C, "hello".into())));

        // Act
        f.handle.on_button_pressed(SlotId::C);
        let handled = f.controller.tick(&f.queue);

        // Assert
        assert_eq!(handled, 1);
        assert_eq!(f.emulator.events(), vec![EmulatedEvent::Text("hello".into())]);
    }

    #[test]
    fn test_invalid_assignment_leaves_slot_unchanged() {
        let mut f = fixture();
        let before = f.controller.descriptor(SlotId::A);

        f.controller
            .handle(UiTask::Command(UiCommand::Assign(SlotId::A, "press:nosuchkey".into())));

        assert_eq!(f.controller.descriptor(SlotId::A), before);
        assert!(f.surface.lines()[0].starts_with("invalid action for A"));
    }

    #[test]
    fn test_status_changes_reach_surface() {
        let mut f = fixture();

        f.handle.on_state_changed(ConnectionState::Connected);
        f.controller.tick(&f.queue);

        assert_eq!(f.controller.status(), ConnectionState::Connected);
        assert_eq!(f.surface.lines(), vec!["status connected"]);
    }

    #[test]
    fn test_recorded_combination_is_assigned_to_slot() {
        // Arrange
        let mut f = fixture();
        f.controller.handle(UiTask::Command(UiCommand::Record(SlotId::B)));
        assert!(f.controller.is_recording());

        // Act: edges arrive through the hook's sink, like the real hook thread.
        assert!(f.hook.emit(KeyEdge::down("ctrl")));
        assert!(f.hook.emit(KeyEdge::down("a")));
        assert!(f.hook.emit(KeyEdge::up("a")));
        assert!(f.hook.emit(KeyEdge::up("ctrl")));
        f.controller.tick(&f.queue);

        // Assert
        assert!(!f.controller.is_recording());
        assert_eq!(f.hook.release_count(), 1);
        assert_eq!(
            f.controller.descriptor(SlotId::B),
            ActionDescriptor::hotkey("ctrl+a").unwrap()
        );
        assert_eq!(
            f.surface.lines(),
            vec![
                "display B press a key combination...",
                "display B ctrl",
                "display B ctrl+a",
                "finished B ctrl+a",
            ]
        );
    }

    #[test]
    fn test_stop_with_nothing_recorded_keeps_slot() {
        let mut f = fixture();
        let before = f.controller.descriptor(SlotId::D);

        f.controller.start_capture(SlotId::D);
        f.controller.stop_capture();

        assert!(!f.controller.is_recording());
        assert_eq!(f.controller.descriptor(SlotId::D), before);
        assert_eq!(f.surface.lines().last().unwrap(), "no keys recorded for button D");
    }

    #[tokio::test]
    async fn test_run_until_quits_and_releases_active_capture() {
        // Arrange
        let mut f = fixture();
        f.handle.post(UiTask::Command(UiCommand::Record(SlotId::A)));
        f.handle.post(UiTask::Command(UiCommand::Quit));

        // Act
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            f.controller
                .run_until(&f.queue, Duration::from_millis(5), std::future::pending::<()>()),
        )
        .await;

        // Assert
        assert!(finished.is_ok(), "quit must end the loop");
        assert!(f.controller.quit_requested());
        assert!(!f.controller.is_recording());
        assert_eq!(f.hook.acquire_count(), 1);
        assert_eq!(f.hook.release_count(), 1);
    }

    #[test]
    fn test_parse_bare_letter_triggers_slot() {
        assert_eq!(UiCommand::parse("C"), Ok(UiCommand::Trigger(SlotId::C)));
        assert_eq!(UiCommand::parse("  press  H "), Ok(UiCommand::Trigger(SlotId::H)));
    }

    #[test]
    fn test_parse_record_stop_show_quit() {
        assert_eq!(UiCommand::parse("record B"), Ok(UiCommand::Record(SlotId::B)));
        assert_eq!(UiCommand::parse("stop"), Ok(UiCommand::StopRecording));
        assert_eq!(UiCommand::parse("show"), Ok(UiCommand::Show));
        assert_eq!(UiCommand::parse("QUIT"), Ok(UiCommand::Quit));
    }

    #[test]
    fn test_parse_set_keeps_action_text_verbatim() {
        assert_eq!(
            UiCommand::parse("set D hello  world"),
            Ok(UiCommand::Assign(SlotId::D, "hello  world".into()))
        );
        assert_eq!(
            UiCommand::parse("set A hotkey:ctrl+c"),
            Ok(UiCommand::Assign(SlotId::A, "hotkey:ctrl+c".into()))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_slots_and_verbs() {
        assert!(UiCommand::parse("Z").is_err());
        assert!(UiCommand::parse("record").is_err());
        assert!(UiCommand::parse("set A").is_err());
        assert!(UiCommand::parse("dance now").is_err());
    }

    #[test]
    fn test_queue_preserves_order_and_observer_posts() {
        // Arrange
        let (handle, queue) = ui_queue();

        // Act
        handle.on_state_changed(ConnectionState::Connected);
        handle.on_button_pressed(SlotId::A);
        (handle.edge_sink())(KeyEdge::down("ctrl"));

        // Assert
        assert_eq!(
            queue.drain(),
            vec![
                UiTask::StatusChanged(ConnectionState::Connected),
                UiTask::ButtonPressed(SlotId::A),
                UiTask::KeyEdge(KeyEdge::down("ctrl")),
            ]
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let (handle, queue) = ui_queue();
        for _ in 0..UI_QUEUE_CAPACITY {
            assert!(handle.post(UiTask::ButtonPressed(SlotId::A)));
        }

        assert!(!handle.post(UiTask::ButtonPressed(SlotId::B)));
        assert_eq!(queue.drain().len(), UI_QUEUE_CAPACITY);
    }
}
