/*!
 * Signal Types
 * Signal identities, dispatch options and result types
 */

use crate::names;
use nix::errno::Errno;
use nix::sys::signal::{SaFlags, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Backend identifier, mirrors the POSIX implementation of the dispatch engine.
pub const IMPLEMENTATION: &str = "posix";

/// Highest signal number the registration table can address.
///
/// Every named kind on supported platforms has a number below this; the
/// registration table and [`crate::SignalSet`] are sized by it.
pub const MAX_SIGNAL: usize = 64;

/// Signal operation result
pub type SignalResult<T> = Result<T, SignalError>;

/// Callback invoked by the trampoline with the kind's symbolic name.
///
/// The registration table exclusively owns the callback; re-registering a
/// kind drops the previous one. An `Err` return propagates out of the
/// safe-point poll that drained the signal.
pub type HandlerFn = Box<dyn FnMut(&'static str) -> anyhow::Result<()> + Send + 'static>;

/// Signal errors
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("signal '{0}' not supported")]
    InvalidSignal(String),

    #[error("flag '{0}' not supported")]
    InvalidFlag(String),

    #[error("mask operation '{0}' not supported")]
    InvalidMaskOp(String),

    #[error("system error: {0}")]
    Os(#[from] Errno),

    #[error("handler for '{kind}' failed: {error:#}")]
    Handler {
        kind: &'static str,
        error: anyhow::Error,
    },
}

/// Symbolic identity of an OS asynchronous signal.
///
/// Resolved from case-insensitive names (synonyms included, e.g. `int` and
/// `interrupt`); a kind absent on the host platform is simply not in the
/// lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalKind(Signal);

impl SignalKind {
    /// Resolve a symbolic name, case-insensitively.
    pub fn from_name(name: &str) -> SignalResult<Self> {
        names::lookup_signal(name).map(SignalKind)
    }

    /// Whether a name resolves on this platform. Table lookup only, no OS call.
    pub fn defined(name: &str) -> bool {
        names::lookup_signal(name).is_ok()
    }

    /// Canonical short name (`"int"`, `"term"`, ...).
    pub fn name(self) -> &'static str {
        names::canonical_name(self.0)
    }

    /// Platform signal number.
    pub fn number(self) -> i32 {
        self.0 as i32
    }

    /// All kinds known on this platform, in ascending numeric order.
    pub fn iter() -> impl Iterator<Item = SignalKind> {
        (1..MAX_SIGNAL as i32).filter_map(|n| Signal::try_from(n).ok().map(SignalKind))
    }

    pub(crate) fn index(self) -> usize {
        self.number() as usize
    }

    pub(crate) fn as_nix(self) -> Signal {
        self.0
    }
}

impl From<Signal> for SignalKind {
    fn from(signal: Signal) -> Self {
        SignalKind(signal)
    }
}

impl FromStr for SignalKind {
    type Err = SignalError;

    fn from_str(s: &str) -> SignalResult<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for SignalKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for SignalKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        SignalKind::from_name(&name).map_err(serde::de::Error::custom)
    }
}

/// How [`mask`](crate::traits::SignalMasking::mask) combines the new set with
/// the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskHow {
    /// Add signals to the blocked set
    Block,
    /// Remove signals from the blocked set
    Unblock,
    /// Replace the blocked set
    Set,
}

impl MaskHow {
    /// Resolve the textual operation names used by script hosts.
    pub fn from_name(name: &str) -> SignalResult<Self> {
        match name {
            "block" => Ok(MaskHow::Block),
            "unblock" => Ok(MaskHow::Unblock),
            "set" => Ok(MaskHow::Set),
            _ => Err(SignalError::InvalidMaskOp(name.to_string())),
        }
    }
}

impl FromStr for MaskHow {
    type Err = SignalError;

    fn from_str(s: &str) -> SignalResult<Self> {
        Self::from_name(s)
    }
}

/// Options for [`catch`](crate::traits::SignalCatching::catch): sigaction
/// flags plus the set kept OS-blocked while the kind's callback runs.
#[derive(Debug, Clone, Copy)]
pub struct CatchOptions {
    pub flags: SaFlags,
    pub blocked: crate::set::SignalSet,
}

impl CatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse action-flag names (`restart`, `oneshot`, ...); synonyms map to
    /// the same OS flag.
    pub fn from_flag_names<'a, I>(names: I) -> SignalResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Ok(Self {
            flags: names::lookup_flags(names)?,
            blocked: crate::set::SignalSet::empty(),
        })
    }

    pub fn blocked(mut self, blocked: crate::set::SignalSet) -> Self {
        self.blocked = blocked;
        self
    }
}

impl Default for CatchOptions {
    fn default() -> Self {
        Self {
            flags: SaFlags::empty(),
            blocked: crate::set::SignalSet::empty(),
        }
    }
}

/// Dispatch statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchStats {
    pub handlers_registered: usize,
    pub drains: u64,
    pub callbacks_invoked: u64,
    pub handler_errors: u64,
}
