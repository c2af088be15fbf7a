/*!
 * Raw Handler
 * The OS-installed signal handler and its sigprocmask helpers
 *
 * Runs in signal-delivery context. Permitted operations: atomic flag stores,
 * one sigprocmask call, arming the host hook. No allocation, no locks, no
 * logging, no callback invocation. Anything else added here breaks the core
 * safety invariant of the crate.
 */

use crate::registry;
use crate::types::MAX_SIGNAL;
use nix::errno::Errno;
use std::mem::MaybeUninit;
use std::ptr;

pub(crate) extern "C" fn raw_handler(signo: libc::c_int) {
    let saved_errno = Errno::last_raw();

    if let Ok(index) = usize::try_from(signo) {
        if index < MAX_SIGNAL {
            if !registry::arm() {
                if let Some(hook) = registry::hook() {
                    hook.divert();
                }
            }

            // The sigaction mask only covers the handler itself; the callback
            // runs later in normal context, so its blocked set must be applied
            // here to hold until the trampoline lifts it.
            let bits = registry::handler_block_bits(index);
            if bits != 0 {
                change_mask(libc::SIG_BLOCK, bits);
            }

            registry::set_triggered(index);
            registry::set_caught_any();
            registry::set_pending();
        }
    }

    Errno::set_raw(saved_errno);
}

pub(crate) fn os_unblock_bits(bits: u64) {
    change_mask(libc::SIG_UNBLOCK, bits);
}

fn change_mask(how: libc::c_int, bits: u64) {
    unsafe {
        let mut set = MaybeUninit::<libc::sigset_t>::uninit();
        libc::sigemptyset(set.as_mut_ptr());
        let mut set = set.assume_init();
        for signo in 1..MAX_SIGNAL {
            if bits & (1u64 << signo) != 0 {
                libc::sigaddset(&mut set, signo as libc::c_int);
            }
        }
        libc::sigprocmask(how, &set, ptr::null_mut());
    }
}
