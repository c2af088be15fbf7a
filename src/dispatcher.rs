/*!
 * Signal Dispatcher
 * Synchronous control surface over the process-wide registration table
 */

use crate::raw;
use crate::registry;
use crate::set::SignalSet;
use crate::trampoline;
use crate::traits::{HostHook, SafePoint, SignalCatching, SignalMasking};
use crate::types::{CatchOptions, DispatchStats, HandlerFn, MaskHow, SignalKind, SignalResult};
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow};
use std::mem::MaybeUninit;

/// Handle over the process-wide dispatch engine.
///
/// The underlying registration table is a process singleton (OS delivery
/// addresses handlers by numeric identity), so every handle operates on the
/// same state; the handle exists to carry the trait surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDispatcher {
    _private: (),
}

impl SignalDispatcher {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Install the host execution hook. One hook per process; returns false
    /// (and keeps the first) if one was already installed.
    pub fn install_hook(&self, hook: Box<dyn HostHook>) -> bool {
        let installed = registry::install_hook(hook);
        if installed {
            info!("Host execution hook installed");
        } else {
            warn!("Host execution hook already installed, keeping the first");
        }
        installed
    }

    /// Dispatch statistics snapshot.
    pub fn stats(&self) -> DispatchStats {
        registry::COUNTERS.snapshot()
    }
}

impl SignalCatching for SignalDispatcher {
    fn catch(
        &self,
        kind: SignalKind,
        handler: Option<HandlerFn>,
        options: CatchOptions,
    ) -> SignalResult<()> {
        let index = kind.index();
        let has_handler = handler.is_some();

        // Hold delivery of this kind while its table entry is inconsistent;
        // the raw handler must never observe a half-updated entry. If the
        // caller already had the kind blocked, it stays blocked afterwards.
        let mut guard = SigSet::empty();
        guard.add(kind.as_nix());
        let mut prior = SigSet::empty();
        signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(&guard), Some(&mut prior))?;
        let was_blocked = prior.contains(kind.as_nix());

        registry::set_handler_block_bits(index, options.blocked.bits());
        registry::store_callback(index, handler);

        let action = SigAction::new(
            SigHandler::Handler(raw::raw_handler),
            options.flags,
            options.blocked.to_nix(),
        );
        let installed = unsafe { signal::sigaction(kind.as_nix(), &action) };

        if !was_blocked {
            signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&guard), None)?;
        }
        installed?;

        info!(
            "Caught signal '{}' (handler: {}, blocked during handler: {})",
            kind, has_handler, options.blocked
        );
        Ok(())
    }

    fn ignore(&self, kinds: &[SignalKind]) -> SignalResult<()> {
        set_disposition(kinds, SigHandler::SigIgn, "ignore")
    }

    fn set_default(&self, kinds: &[SignalKind]) -> SignalResult<()> {
        set_disposition(kinds, SigHandler::SigDfl, "default")
    }

    fn defined(&self, name: &str) -> bool {
        SignalKind::defined(name)
    }

    fn caught(&self, kind: SignalKind) -> bool {
        let was = registry::consume_triggered(kind.index());
        registry::clear_caught_any();
        was
    }

    fn caught_any(&self) -> bool {
        registry::consume_caught_any()
    }

    fn raise(&self, kind: SignalKind) -> SignalResult<()> {
        debug!("Raising signal '{}'", kind);
        signal::raise(kind.as_nix())?;
        Ok(())
    }
}

impl SignalMasking for SignalDispatcher {
    fn allow(&self, kinds: &[SignalKind]) -> SignalResult<()> {
        let set = SignalSet::from_kinds(kinds.iter().copied());
        signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&set.to_nix()), None)?;
        debug!("Released delivery of {}", set);
        Ok(())
    }

    fn block(&self, kinds: &[SignalKind]) -> SignalResult<()> {
        let set = SignalSet::from_kinds(kinds.iter().copied());
        signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(&set.to_nix()), None)?;
        debug!("Holding delivery of {}", set);
        Ok(())
    }

    fn mask(&self, how: MaskHow, new: SignalSet) -> SignalResult<SignalSet> {
        let mut old = SigSet::empty();
        signal::sigprocmask(sigmask_how(how), Some(&new.to_nix()), Some(&mut old))?;
        debug!("Mask {:?} {}", how, new);
        Ok(SignalSet::from_nix(&old))
    }

    fn pending(&self) -> SignalResult<SignalSet> {
        let mut raw = MaybeUninit::<libc::sigset_t>::uninit();
        if unsafe { libc::sigpending(raw.as_mut_ptr()) } != 0 {
            return Err(Errno::last().into());
        }
        Ok(SignalSet::from_raw(unsafe { &raw.assume_init() }))
    }

    fn suspend(&self, set: SignalSet) -> Errno {
        debug!("Suspending until delivery outside {}", set);
        let raw = set.to_raw();
        unsafe { libc::sigsuspend(&raw) };
        Errno::last()
    }
}

impl SafePoint for SignalDispatcher {
    fn poll_safe_point(&self) -> SignalResult<usize> {
        trampoline::poll_safe_point()
    }
}

fn set_disposition(
    kinds: &[SignalKind],
    handler: SigHandler,
    what: &str,
) -> SignalResult<()> {
    for &kind in kinds {
        registry::store_callback(kind.index(), None);
        let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
        unsafe { signal::sigaction(kind.as_nix(), &action) }?;
        info!("Set '{}' disposition to {}", kind, what);
    }
    Ok(())
}

fn sigmask_how(how: MaskHow) -> SigmaskHow {
    match how {
        MaskHow::Block => SigmaskHow::SIG_BLOCK,
        MaskHow::Unblock => SigmaskHow::SIG_UNBLOCK,
        MaskHow::Set => SigmaskHow::SIG_SETMASK,
    }
}
