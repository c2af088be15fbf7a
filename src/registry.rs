/*!
 * Registration Table
 * Process-wide per-kind signal state shared between the two execution contexts
 *
 * Everything the raw handler touches is a primitively atomic flag in a
 * const-initialized fixed array. The callback slots sit behind a mutex that
 * only normal context acquires; serialization against signal context is done
 * by OS-level blocking around mutation, never by the lock.
 */

use crate::traits::HostHook;
use crate::types::{DispatchStats, HandlerFn, MAX_SIGNAL};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Per-kind triggered flags. Set in signal context, cleared in normal context.
static TRIGGERED: [AtomicBool; MAX_SIGNAL] = [const { AtomicBool::new(false) }; MAX_SIGNAL];

/// Per-kind blocked-during-handler sets, stored as raw bits so signal context
/// can read them allocation-free.
static HANDLER_BLOCK: [AtomicU64; MAX_SIGNAL] = [const { AtomicU64::new(0) }; MAX_SIGNAL];

/// Drain-work flag: best-effort OR of all triggered flags.
static PENDING: AtomicBool = AtomicBool::new(false);

/// Observation flag backing argument-less `caught`.
static CAUGHT_ANY: AtomicBool = AtomicBool::new(false);

/// Hook-armed latch: set on the first delivery since the last drain.
static ARMED: AtomicBool = AtomicBool::new(false);

/// Reentrancy guard around the trampoline.
static DRAINING: AtomicBool = AtomicBool::new(false);

static HOOK: OnceLock<Box<dyn HostHook>> = OnceLock::new();

struct CallbackSlots([Option<HandlerFn>; MAX_SIGNAL]);

static CALLBACKS: Mutex<CallbackSlots> =
    Mutex::new(CallbackSlots([const { None }; MAX_SIGNAL]));

pub(crate) fn set_triggered(index: usize) {
    TRIGGERED[index].store(true, Ordering::SeqCst);
}

pub(crate) fn consume_triggered(index: usize) -> bool {
    TRIGGERED[index].swap(false, Ordering::SeqCst)
}

pub(crate) fn is_triggered(index: usize) -> bool {
    TRIGGERED[index].load(Ordering::SeqCst)
}

pub(crate) fn set_pending() {
    PENDING.store(true, Ordering::SeqCst);
}

pub(crate) fn consume_pending() -> bool {
    PENDING.swap(false, Ordering::SeqCst)
}

pub(crate) fn pending_hint() -> bool {
    PENDING.load(Ordering::SeqCst)
}

pub(crate) fn set_caught_any() {
    CAUGHT_ANY.store(true, Ordering::SeqCst);
}

pub(crate) fn clear_caught_any() {
    CAUGHT_ANY.store(false, Ordering::SeqCst);
}

pub(crate) fn consume_caught_any() -> bool {
    CAUGHT_ANY.swap(false, Ordering::SeqCst)
}

/// Returns whether the hook was already armed.
pub(crate) fn arm() -> bool {
    ARMED.swap(true, Ordering::SeqCst)
}

pub(crate) fn disarm() {
    ARMED.store(false, Ordering::SeqCst);
}

/// Returns whether a drain was already in progress.
pub(crate) fn begin_drain() -> bool {
    DRAINING.swap(true, Ordering::SeqCst)
}

pub(crate) fn end_drain() {
    DRAINING.store(false, Ordering::SeqCst);
}

pub(crate) fn handler_block_bits(index: usize) -> u64 {
    HANDLER_BLOCK[index].load(Ordering::SeqCst)
}

pub(crate) fn set_handler_block_bits(index: usize, bits: u64) {
    HANDLER_BLOCK[index].store(bits, Ordering::SeqCst);
}

pub(crate) fn install_hook(hook: Box<dyn HostHook>) -> bool {
    HOOK.set(hook).is_ok()
}

pub(crate) fn hook() -> Option<&'static dyn HostHook> {
    HOOK.get().map(Box::as_ref)
}

/// Replace the owned callback for a kind, dropping the previous owner.
pub(crate) fn store_callback(index: usize, callback: Option<HandlerFn>) {
    let registering = callback.is_some();
    let previous = {
        let mut slots = CALLBACKS.lock();
        std::mem::replace(&mut slots.0[index], callback)
    };
    match (previous.is_some(), registering) {
        (false, true) => COUNTERS.inc_handlers(),
        (true, false) => COUNTERS.dec_handlers(),
        _ => {}
    }
}

/// Move the callback out for invocation; the slot stays empty until
/// [`restore_callback`] or a re-registration fills it.
pub(crate) fn take_callback(index: usize) -> Option<HandlerFn> {
    CALLBACKS.lock().0[index].take()
}

/// Put a taken callback back unless the kind was re-registered while it ran,
/// in which case the new registration wins and the old callback is dropped.
pub(crate) fn restore_callback(index: usize, callback: HandlerFn) {
    let mut slots = CALLBACKS.lock();
    if slots.0[index].is_none() {
        slots.0[index] = Some(callback);
    } else {
        COUNTERS.dec_handlers();
    }
}

/// Atomic dispatch counters, updated only from normal context.
pub(crate) struct Counters {
    handlers_registered: AtomicUsize,
    drains: AtomicU64,
    callbacks_invoked: AtomicU64,
    handler_errors: AtomicU64,
}

pub(crate) static COUNTERS: Counters = Counters::new();

impl Counters {
    const fn new() -> Self {
        Self {
            handlers_registered: AtomicUsize::new(0),
            drains: AtomicU64::new(0),
            callbacks_invoked: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
        }
    }

    fn inc_handlers(&self) {
        self.handlers_registered.fetch_add(1, Ordering::Relaxed);
    }

    fn dec_handlers(&self) {
        self.handlers_registered.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_drains(&self) {
        self.drains.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_invoked(&self) {
        self.callbacks_invoked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_handler_errors(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot for monitoring; values are individually accurate but not
    /// mutually consistent under concurrent updates.
    pub(crate) fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            handlers_registered: self.handlers_registered.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            callbacks_invoked: self.callbacks_invoked.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
        }
    }
}
