/*!
 * Trampoline
 * Deferred drain loop converting captured flags into callback invocations
 */

use crate::raw;
use crate::registry;
use crate::types::{SignalError, SignalKind, SignalResult};
use log::{debug, warn};

/// Drain captured deliveries from normal execution context.
///
/// Entered by the host's safe-point poll, or by the host hook the raw handler
/// armed. Reentrant entry (a callback polling its own safe point) is a no-op.
pub(crate) fn poll_safe_point() -> SignalResult<usize> {
    if !registry::pending_hint() {
        return Ok(0);
    }
    if registry::begin_drain() {
        return Ok(0);
    }

    let result = drain();

    // Restore before disarming: once disarmed, the next delivery re-diverts.
    if let Some(hook) = registry::hook() {
        hook.restore();
    }
    registry::disarm();
    registry::end_drain();

    result
}

fn drain() -> SignalResult<usize> {
    registry::COUNTERS.inc_drains();
    let mut invoked = 0usize;

    // The outer loop re-checks because a callback may itself raise further
    // signals. Inner order is ascending numeric, deterministically.
    while registry::consume_pending() {
        for kind in SignalKind::iter() {
            let index = kind.index();
            if !registry::is_triggered(index) {
                continue;
            }

            // No callback: leave the flag for `caught` to consume.
            let Some(mut callback) = registry::take_callback(index) else {
                continue;
            };

            registry::consume_triggered(index);
            debug!("Draining signal '{}' into its callback", kind);

            let outcome = callback(kind.name());
            registry::restore_callback(index, callback);
            registry::COUNTERS.inc_invoked();
            invoked += 1;

            match outcome {
                Ok(()) => {
                    let bits = registry::handler_block_bits(index);
                    if bits != 0 {
                        raw::os_unblock_bits(bits);
                    }
                }
                Err(error) => {
                    // Still-triggered kinds stay queued for the next poll.
                    // The kind's blocked-during-handler set stays applied
                    // until a later successful drain; documented limitation.
                    registry::COUNTERS.inc_handler_errors();
                    registry::set_pending();
                    warn!("Handler for signal '{}' failed: {:#}", kind, error);
                    return Err(SignalError::Handler {
                        kind: kind.name(),
                        error,
                    });
                }
            }
        }
    }

    Ok(invoked)
}
