/*!
 * sigtramp
 * Asynchronous-signal-to-safe-callback dispatch for single-threaded hosts
 *
 * OS signal delivery happens in a context where almost nothing is legal: no
 * allocation, no locks, no reentry into a managed runtime. This crate installs
 * a raw handler restricted to flag-setting, then drains those flags into
 * ordinary callbacks from a safe point in the host's normal execution, with a
 * value-type signal-set algebra for masking control.
 */

mod dispatcher;
mod names;
mod raw;
mod registry;
mod set;
mod trampoline;
mod traits;
mod types;

// Re-export public API
pub use dispatcher::SignalDispatcher;
pub use set::SignalSet;
pub use traits::{HostHook, SafePoint, SignalCatching, SignalDispatch, SignalMasking};
pub use types::{
    CatchOptions, DispatchStats, HandlerFn, MaskHow, SignalError, SignalKind, SignalResult,
    IMPLEMENTATION, MAX_SIGNAL,
};

// The typed OS identities callers may want alongside the name-based surface
pub use nix::errno::Errno;
pub use nix::sys::signal::{SaFlags, Signal};
