//! Transaction manager
//!
//! Hands out transaction IDs and transaction times, and owns the lock table
//! that serializes transactions on the same entity.
//!
//! ## Isolation
//!
//! Every transaction that modifies a resource holds that resource's lock
//! from its first read until commit or abort. Group creation and deletion
//! hold the group's lock. Anything a lock does not cover (a group vanishing
//! under a resource write) is caught by commit-time validation in
//! [`TransactionContext::commit`].
//!
//! ## Transaction clock
//!
//! `tick()` returns `max(wall clock, previous tick + 1µs)`, so transaction
//! times are strictly increasing even when the wall clock stalls or steps
//! back. Every entity a transaction touches is stamped with the same tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use xreg_core::{GroupKey, ResourceKey, Timestamp};
use xreg_storage::RegistryStore;

use crate::transaction::{CommitError, TransactionContext};

/// Entity a transaction can lock
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// A group (create/delete)
    Group(GroupKey),
    /// A resource (all version and meta writes)
    Resource(ResourceKey),
}

impl From<GroupKey> for LockKey {
    fn from(key: GroupKey) -> Self {
        LockKey::Group(key)
    }
}

impl From<ResourceKey> for LockKey {
    fn from(key: ResourceKey) -> Self {
        LockKey::Resource(key)
    }
}

/// Manages transaction lifecycle
pub struct TransactionManager {
    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Last handed out transaction time
    clock: Mutex<Timestamp>,

    /// One mutex per locked entity, created on first use
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl TransactionManager {
    /// Create a new transaction manager
    pub fn new() -> Self {
        Self::with_clock(Timestamp::EPOCH)
    }

    /// Create a manager whose clock will never return a time at or before `last`
    ///
    /// Used after loading a snapshot so new stamps sort after stored ones.
    pub fn with_clock(last: Timestamp) -> Self {
        TransactionManager {
            next_txn_id: AtomicU64::new(1),
            clock: Mutex::new(last),
            locks: DashMap::new(),
        }
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Next transaction time, strictly greater than every previous one
    pub fn tick(&self) -> Timestamp {
        let mut last = self.clock.lock();
        let now = Timestamp::now();
        let next = if now > *last { now } else { last.next() };
        *last = next;
        next
    }

    /// The mutex guarding `key`
    ///
    /// Callers hold the returned mutex's guard for the transaction's lifetime:
    ///
    /// ```ignore
    /// let lock = manager.lock_for(key);
    /// let _guard = lock.lock();
    /// ```
    pub fn lock_for(&self, key: impl Into<LockKey>) -> Arc<Mutex<()>> {
        let key = key.into();
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop lock table entries nobody is holding or waiting on
    pub fn prune_locks(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before.saturating_sub(self.locks.len());
        if removed > 0 {
            trace!(target: "xreg::txn", removed, "Pruned idle locks");
        }
        removed
    }

    /// Number of entries in the lock table
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Begin a transaction over `store`
    pub fn begin(&self, store: Arc<RegistryStore>) -> TransactionContext {
        let txn_id = self.next_txn_id();
        let now = self.tick();
        trace!(target: "xreg::txn", txn_id, now = %now, "Transaction started");
        TransactionContext::new(txn_id, now, store)
    }

    /// Validate and apply a transaction
    ///
    /// Returns the store's commit version.
    pub fn commit(&self, txn: &mut TransactionContext) -> Result<u64, CommitError> {
        txn.commit()
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
