//! Windows low-level keyboard hook for hotkey capture.
//!
//! While held exclusively, a `WH_KEYBOARD_LL` hook runs on a dedicated
//! Win32 message-loop thread.  Every key edge is reported to the sink and
//! swallowed, so the chord being recorded does not also trigger whatever it
//! is bound to.  Releasing posts `WM_QUIT` to that thread, which unhooks
//! before exiting.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use deck_core::KeyMapper;
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS, LLKHF_INJECTED, MSG,
    WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP,
};

use crate::application::capture_hotkey::{CaptureError, EdgeSink, KeyEdge, KeyboardHook};

/// Where the hook callback delivers edges.  `Some` while held exclusively.
static EDGE_SINK: Mutex<Option<EdgeSink>> = Mutex::new(None);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct HookThread {
    thread_id: u32,
    join: JoinHandle<()>,
}

/// Windows implementation of [`KeyboardHook`].
#[derive(Default)]
pub struct WindowsKeyboardHook {
    thread: Mutex<Option<HookThread>>,
    exclusive: AtomicBool,
}

impl WindowsKeyboardHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyboardHook for WindowsKeyboardHook {
    fn acquire_exclusive(&self, sink: EdgeSink) -> Result<(), CaptureError> {
        let mut thread = lock(&self.thread);
        if thread.is_some() {
            return Err(CaptureError::HookAcquire(
                "keyboard hook is already held".to_string(),
            ));
        }

        *lock(&EDGE_SINK) = Some(sink);

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, String>>();
        let join = thread::Builder::new()
            .name("deck-capture-hook".to_string())
            .spawn(move || run_hook_message_loop(ready_tx))
            .map_err(|e| {
                *lock(&EDGE_SINK) = None;
                CaptureError::HookAcquire(e.to_string())
            })?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                *thread = Some(HookThread { thread_id, join });
                self.exclusive.store(true, Ordering::SeqCst);
                Ok(())
            }
            Ok(Err(reason)) => {
                *lock(&EDGE_SINK) = None;
                let _ = join.join();
                Err(CaptureError::HookAcquire(reason))
            }
            Err(_) => {
                *lock(&EDGE_SINK) = None;
                Err(CaptureError::HookAcquire(
                    "hook thread exited before installing the hook".to_string(),
                ))
            }
        }
    }

    fn release_exclusive(&self) -> Result<(), CaptureError> {
        *lock(&EDGE_SINK) = None;
        self.exclusive.store(false, Ordering::SeqCst);

        let Some(hook_thread) = lock(&self.thread).take() else {
            return Ok(());
        };

        // SAFETY: posting a message to a thread id has no memory-safety
        // preconditions; a stale id only makes the call fail.
        unsafe { PostThreadMessageW(hook_thread.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }
            .map_err(|e| CaptureError::HookRelease(e.to_string()))?;

        hook_thread
            .join
            .join()
            .map_err(|_| CaptureError::HookRelease("hook thread panicked".to_string()))
    }

    fn is_exclusive(&self) -> bool {
        self.exclusive.load(Ordering::SeqCst)
    }
}

impl Drop for WindowsKeyboardHook {
    fn drop(&mut self) {
        let _ = self.release_exclusive();
    }
}

/// Entry point for the hook thread: install, report, pump, uninstall.
fn run_hook_message_loop(ready: mpsc::Sender<Result<u32, String>>) {
    // SAFETY: a low-level hook needs a message loop on the installing thread,
    // which is this one.
    let hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) } {
        Ok(hook) => hook,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    // SAFETY: always safe to call.
    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready.send(Ok(thread_id));

    let mut msg = MSG::default();
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern; exits on WM_QUIT.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        UnhookWindowsHookEx(hook).ok();
    }
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// Called by Windows on the hook thread.  It must return quickly, so the
/// sink only enqueues.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

    // Synthesized input (including our own) passes through.
    if (kbs.flags & LLKHF_INJECTED) != KBDLLHOOKSTRUCT_FLAGS(0) {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    let vk = kbs.vkCode as u8;
    let name = KeyMapper::windows_vk_to_key(vk)
        .map(|key| key.name())
        .unwrap_or_else(|| format!("vk{vk:02x}"));

    let edge = match w_param.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => KeyEdge::down(name),
        WM_KEYUP | WM_SYSKEYUP => KeyEdge::up(name),
        _ => return CallNextHookEx(None, n_code, w_param, l_param),
    };

    if let Some(sink) = lock(&EDGE_SINK).as_ref() {
        sink(edge);
        return LRESULT(1);
    }

    // SAFETY: Forward the event to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}
