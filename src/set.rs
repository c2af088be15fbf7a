/*!
 * Signal Sets
 * Value-type bitset over signal kinds with copy-on-operation algebra
 */

use crate::types::{SignalKind, SignalResult, MAX_SIGNAL};
use nix::sys::signal::SigSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::MaybeUninit;
use std::ops::{BitOr, Not, Sub};

/// A set of [`SignalKind`]s.
///
/// Plain `Copy` value; union, difference and complement return new sets and
/// never mutate their inputs. Capacity is fixed at [`MAX_SIGNAL`]. The
/// complement universe is the set of kinds known on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SignalSet {
    bits: u64,
}

impl SignalSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Every kind known on this platform.
    pub fn full() -> Self {
        SignalKind::iter().fold(Self::empty(), |mut set, kind| {
            set.insert(kind);
            set
        })
    }

    pub fn from_kinds<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = SignalKind>,
    {
        kinds.into_iter().fold(Self::empty(), |mut set, kind| {
            set.insert(kind);
            set
        })
    }

    /// Build a set from symbolic names: start full or empty per `fill`, then
    /// toggle each named kind (remove from a full start, add to an empty one).
    pub fn build<'a, I>(fill: bool, names: I) -> SignalResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = if fill { Self::full() } else { Self::empty() };
        for name in names {
            let kind = SignalKind::from_name(name)?;
            if fill {
                set.remove(kind);
            } else {
                set.insert(kind);
            }
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn contains(&self, kind: SignalKind) -> bool {
        self.bits & bit(kind) != 0
    }

    /// Membership test by symbolic name; fails on a name unknown to this
    /// platform.
    pub fn contains_name(&self, name: &str) -> SignalResult<bool> {
        Ok(self.contains(SignalKind::from_name(name)?))
    }

    pub fn insert(&mut self, kind: SignalKind) {
        self.bits |= bit(kind);
    }

    pub fn remove(&mut self, kind: SignalKind) {
        self.bits &= !bit(kind);
    }

    /// Add or remove by symbolic name.
    pub fn set_name(&mut self, name: &str, member: bool) -> SignalResult<()> {
        let kind = SignalKind::from_name(name)?;
        if member {
            self.insert(kind);
        } else {
            self.remove(kind);
        }
        Ok(())
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    pub fn difference(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    pub fn complement(self) -> Self {
        Self {
            bits: Self::full().bits & !self.bits,
        }
    }

    /// Member kinds in ascending numeric order.
    pub fn iter(&self) -> impl Iterator<Item = SignalKind> + '_ {
        SignalKind::iter().filter(|kind| self.contains(*kind))
    }

    pub(crate) const fn bits(&self) -> u64 {
        self.bits
    }

    pub(crate) fn to_nix(self) -> SigSet {
        let mut set = SigSet::empty();
        for kind in self.iter() {
            set.add(kind.as_nix());
        }
        set
    }

    pub(crate) fn from_nix(set: &SigSet) -> Self {
        Self::from_kinds(SignalKind::iter().filter(|kind| set.contains(kind.as_nix())))
    }

    pub(crate) fn to_raw(self) -> libc::sigset_t {
        unsafe {
            let mut raw = MaybeUninit::<libc::sigset_t>::uninit();
            libc::sigemptyset(raw.as_mut_ptr());
            let mut raw = raw.assume_init();
            for kind in self.iter() {
                libc::sigaddset(&mut raw, kind.number());
            }
            raw
        }
    }

    pub(crate) fn from_raw(raw: &libc::sigset_t) -> Self {
        Self::from_kinds(
            SignalKind::iter()
                .filter(|kind| unsafe { libc::sigismember(raw, kind.number()) } == 1),
        )
    }
}

fn bit(kind: SignalKind) -> u64 {
    debug_assert!(kind.index() < MAX_SIGNAL);
    1u64 << kind.index()
}

impl FromIterator<SignalKind> for SignalSet {
    fn from_iter<I: IntoIterator<Item = SignalKind>>(iter: I) -> Self {
        Self::from_kinds(iter)
    }
}

impl BitOr for SignalSet {
    type Output = SignalSet;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl Sub for SignalSet {
    type Output = SignalSet;

    fn sub(self, rhs: Self) -> Self {
        self.difference(rhs)
    }
}

impl Not for SignalSet {
    type Output = SignalSet;

    fn not(self) -> Self {
        self.complement()
    }
}

impl fmt::Display for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, kind) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            f.write_str(kind.name())?;
        }
        write!(f, "}}")
    }
}

impl Serialize for SignalSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|kind| kind.name()))
    }
}

impl<'de> Deserialize<'de> for SignalSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        SignalSet::build(false, names.iter().map(String::as_str))
            .map_err(serde::de::Error::custom)
    }
}
