//! Per-entity epoch counter
//!
//! Every registry entity (Registry, Group, Meta, Version) carries an `epoch`.
//! It starts at 1 when the entity is created and increases by exactly one for
//! every transaction that changes the entity's observable state.
//!
//! The epoch doubles as the optimistic-concurrency token: a writer that
//! supplies an epoch must supply the current one, otherwise the write fails
//! with `MismatchedEpoch` and nothing is changed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic per-entity mutation counter
///
/// ## Invariants
///
/// - A live entity's epoch is never 0
/// - An entity's epoch never decreases
/// - One transaction bumps a given entity at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    /// Epoch assigned to a freshly created entity
    pub const INITIAL: Epoch = Epoch(1);

    /// Wrap a raw epoch value
    #[inline]
    pub const fn new(value: u64) -> Self {
        Epoch(value)
    }

    /// Raw value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The epoch following this one
    #[inline]
    pub const fn next(&self) -> Self {
        Epoch(self.0.saturating_add(1))
    }

    /// Advance in place
    #[inline]
    pub fn bump(&mut self) {
        *self = self.next();
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Epoch::INITIAL
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Epoch {
    fn from(value: u64) -> Self {
        Epoch(value)
    }
}
