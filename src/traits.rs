/*!
 * Dispatch Traits
 * Seams between the dispatch engine, its host, and callers
 */

use crate::set::SignalSet;
use crate::types::{CatchOptions, HandlerFn, MaskHow, SignalKind, SignalResult};
use nix::errno::Errno;

/// Host integration for bounded-latency drains.
///
/// A host with a recurring execution step (interpreter instruction dispatch,
/// timer tick, event-loop iteration) implements this so the trampoline runs at
/// the next step after a delivery instead of waiting for the next scheduled
/// safe-point poll.
pub trait HostHook: Send + Sync {
    /// Arrange for the host to call the safe-point poll at its next execution
    /// step, saving any pre-existing hook configuration.
    ///
    /// Called from signal-delivery context, at most once per drain cycle.
    /// Implementations must be async-signal-safe: flag stores only, no
    /// allocation, no locks.
    fn divert(&self);

    /// Undo [`divert`](HostHook::divert), restoring whatever hook
    /// configuration the host had installed before it. Called from normal
    /// context once the drain completes, whether or not it succeeded.
    fn restore(&self);
}

/// Registration surface: route kinds to callbacks or dispositions.
pub trait SignalCatching {
    /// Install a callback (and the raw OS handler) for a kind.
    fn catch(
        &self,
        kind: SignalKind,
        handler: Option<HandlerFn>,
        options: CatchOptions,
    ) -> SignalResult<()>;

    /// Drop any owned callbacks and set the OS ignore disposition.
    fn ignore(&self, kinds: &[SignalKind]) -> SignalResult<()>;

    /// Drop any owned callbacks and restore the OS default disposition.
    fn set_default(&self, kinds: &[SignalKind]) -> SignalResult<()>;

    /// Whether a symbolic name resolves on this platform. No OS call.
    fn defined(&self, name: &str) -> bool;

    /// Test-and-clear the kind's triggered flag. Consuming.
    fn caught(&self, kind: SignalKind) -> bool;

    /// Test-and-clear the any-signal-caught flag. Consuming.
    fn caught_any(&self) -> bool;

    /// Deliver a signal to the current process.
    fn raise(&self, kind: SignalKind) -> SignalResult<()>;
}

/// Process-wide delivery hold/release and mask control.
pub trait SignalMasking {
    /// Release held delivery of the given kinds.
    fn allow(&self, kinds: &[SignalKind]) -> SignalResult<()>;

    /// Hold delivery of the given kinds.
    fn block(&self, kinds: &[SignalKind]) -> SignalResult<()>;

    /// Combine `new` into the blocked mask per `how`; returns the prior mask.
    fn mask(&self, how: MaskHow, new: SignalSet) -> SignalResult<SignalSet>;

    /// Signals currently blocked and undelivered.
    fn pending(&self) -> SignalResult<SignalSet>;

    /// Atomically replace the mask with `set` and wait for an unblocked
    /// delivery; the prior mask is restored on return. Always returns the
    /// interrupting error code, normally `EINTR`.
    fn suspend(&self, set: SignalSet) -> Errno;
}

/// The host's periodic obligation: drain captured deliveries into callbacks.
pub trait SafePoint {
    /// Run the trampoline if any delivery is outstanding; returns the number
    /// of callbacks invoked. A callback error propagates from here, leaving
    /// still-triggered kinds for the next poll.
    fn poll_safe_point(&self) -> SignalResult<usize>;
}

/// Combined dispatch surface.
pub trait SignalDispatch: SignalCatching + SignalMasking + SafePoint {}

impl<T> SignalDispatch for T where T: SignalCatching + SignalMasking + SafePoint {}
