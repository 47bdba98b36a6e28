//! DispatchCommandUseCase: resolves a button press to its action and runs it.
//!
//! Both trigger paths, a device frame and a manual "test button" from the UI,
//! go through [`CommandDispatcher::dispatch`], so they share one throttle
//! window.  A call that lands inside the window is dropped; nothing is queued.
//!
//! The dispatcher lives on the UI context, which is also the only context
//! that injects OS input; injected events are therefore totally ordered
//! regardless of where the trigger came from.

use std::time::Instant;

use deck_core::{ActionDescriptor, SlotId, SlotTable, Throttle};
use thiserror::Error;
use tracing::debug;

use super::execute_action::{ActionExecutionError, ActionExecutor};

/// Returned when a slot assignment could not be stored.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist slot {slot}: {reason}")]
    Persist { slot: SlotId, reason: String },
}

/// Settings collaborator: where slot descriptors are kept.
pub trait SlotStore: Send {
    /// Returns the descriptor currently assigned to `slot`.
    fn get_descriptor(&self, slot: SlotId) -> ActionDescriptor;

    /// Atomically replaces the descriptor assigned to `slot`.
    fn set_descriptor(&mut self, slot: SlotId, descriptor: ActionDescriptor)
        -> Result<(), StoreError>;
}

/// The in-memory table is the simplest store; nothing is persisted.
impl SlotStore for SlotTable {
    fn get_descriptor(&self, slot: SlotId) -> ActionDescriptor {
        self.get(slot).clone()
    }

    fn set_descriptor(
        &mut self,
        slot: SlotId,
        descriptor: ActionDescriptor,
    ) -> Result<(), StoreError> {
        self.set(slot, descriptor);
        Ok(())
    }
}

/// What happened to a dispatch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action ran.
    Executed(SlotId),
    /// Dropped: the previous action ran less than one throttle window ago.
    Throttled(SlotId),
    /// The identifier does not name a slot; nothing happened.
    UnknownSlot(String),
}

/// The Command Dispatcher use case.
pub struct CommandDispatcher {
    store: Box<dyn SlotStore>,
    executor: ActionExecutor,
    throttle: Throttle,
}

impl CommandDispatcher {
    pub fn new(store: Box<dyn SlotStore>, executor: ActionExecutor) -> Self {
        Self::with_throttle(store, executor, Throttle::default())
    }

    pub fn with_throttle(
        store: Box<dyn SlotStore>,
        executor: ActionExecutor,
        throttle: Throttle,
    ) -> Self {
        Self {
            store,
            executor,
            throttle,
        }
    }

    /// Runs the action assigned to `slot`, unless throttled.
    ///
    /// # Errors
    ///
    /// Returns [`ActionExecutionError`] if injection failed.  The throttle
    /// window has still been consumed.
    pub fn dispatch(&mut self, slot: SlotId) -> Result<DispatchOutcome, ActionExecutionError> {
        self.dispatch_at(slot, Instant::now())
    }

    /// [`dispatch`](Self::dispatch) with an explicit clock reading.
    pub fn dispatch_at(
        &mut self,
        slot: SlotId,
        now: Instant,
    ) -> Result<DispatchOutcome, ActionExecutionError> {
        if !self.throttle.try_acquire(now) {
            debug!(%slot, "dispatch throttled");
            return Ok(DispatchOutcome::Throttled(slot));
        }
        let descriptor = self.store.get_descriptor(slot);
        self.executor.execute(&descriptor)?;
        Ok(DispatchOutcome::Executed(slot))
    }

    /// Parses a slot identifier and dispatches it.  Unknown identifiers are
    /// discarded.
    pub fn dispatch_id(&mut self, id: &str) -> Result<DispatchOutcome, ActionExecutionError> {
        match id.trim().parse::<SlotId>() {
            Ok(slot) => self.dispatch(slot),
            Err(_) => {
                debug!(id, "ignoring dispatch for unknown slot");
                Ok(DispatchOutcome::UnknownSlot(id.to_string()))
            }
        }
    }

    /// Reassigns `slot`.  The next dispatch sees the new descriptor.
    pub fn assign(&mut self, slot: SlotId, descriptor: ActionDescriptor) -> Result<(), StoreError> {
        self.store.set_descriptor(slot, descriptor)
    }

    pub fn descriptor(&self, slot: SlotId) -> ActionDescriptor {
        self.store.get_descriptor(slot)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
