//! Transaction context
//!
//! A TransactionContext buffers every change one registry operation makes
//! and applies them to the store in a single step at commit. Reads go
//! through the context so a transaction sees its own staged writes.
//!
//! Alongside the writeset the context keeps *expectations*: facts about
//! committed state the transaction relied on but does not hold a lock for
//! (a group existing, a group not existing yet). They are checked under the
//! store's write lock right before the writeset is applied.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use xreg_core::{
    EntityPath, GroupKey, GroupRecord, RegistryError, ResourceKey, ResourceRecord, Timestamp,
};
use xreg_storage::{Mutation, RegistryStore, StoreState, Writeset};

/// Error type for commit failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// Committed state no longer matches what the transaction relied on
    #[error("commit validation failed: {0}")]
    ValidationFailed(RegistryError),

    /// Transaction was not in correct state for commit
    #[error("invalid transaction state: {0}")]
    InvalidState(String),
}

impl From<CommitError> for RegistryError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(inner) => inner,
            CommitError::InvalidState(msg) => RegistryError::internal(msg),
        }
    }
}

/// Status of a transaction in its lifecycle
///
/// - `Active` → `Committed`
/// - `Active` → `Aborted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Fact about committed state checked at commit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The group must still exist
    GroupExists(GroupKey),
    /// The group must not exist yet
    GroupAbsent(GroupKey),
}

impl Expectation {
    fn check(&self, state: &StoreState) -> Result<(), RegistryError> {
        match self {
            Expectation::GroupExists(key) if !state.groups.contains_key(key) => {
                Err(RegistryError::not_found(key.clone()))
            }
            Expectation::GroupAbsent(key) if state.groups.contains_key(key) => {
                Err(RegistryError::AlreadyExists {
                    subject: EntityPath::Group(key.clone()),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Summary of pending operations that would be discarded on abort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingOperations {
    /// Resource and group puts
    pub puts: usize,
    /// Resource and group deletes
    pub deletes: usize,
    /// Epoch bumps of groups and the registry
    pub bumps: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.puts + self.deletes + self.bumps
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Buffered state of one transaction
///
/// # Lifecycle
///
/// 1. **BEGIN**: created by `TransactionManager::begin`, status is `Active`
/// 2. **READ/WRITE**: `get_resource()`, `put_resource()`, `bump_group()`, ...
/// 3. **COMMIT/ABORT**: `commit()` validates expectations and applies the
///    writeset; `abort()` discards it
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Transaction time; every entity touched is stamped with it
    pub now: Timestamp,

    /// Current transaction status
    pub status: TransactionStatus,

    store: Arc<RegistryStore>,

    /// Mutations in the order they will be applied
    writeset: Writeset,

    /// Read-your-writes overlay; `None` marks a staged delete
    staged_resources: BTreeMap<ResourceKey, Option<ResourceRecord>>,
    staged_groups: BTreeMap<GroupKey, Option<GroupRecord>>,

    expectations: Vec<Expectation>,

    start_time: Instant,
}

impl TransactionContext {
    /// Create a new transaction context
    pub fn new(txn_id: u64, now: Timestamp, store: Arc<RegistryStore>) -> Self {
        TransactionContext {
            txn_id,
            now,
            status: TransactionStatus::Active,
            store,
            writeset: Writeset::new(),
            staged_resources: BTreeMap::new(),
            staged_groups: BTreeMap::new(),
            expectations: Vec::new(),
            start_time: Instant::now(),
        }
    }

    // === Reads ===

    /// Read a resource, seeing this transaction's own writes
    pub fn get_resource(&self, key: &ResourceKey) -> Option<ResourceRecord> {
        match self.staged_resources.get(key) {
            Some(staged) => staged.clone(),
            None => self.store.resource(key),
        }
    }

    /// Read a group, seeing this transaction's own writes
    pub fn get_group(&self, key: &GroupKey) -> Option<GroupRecord> {
        match self.staged_groups.get(key) {
            Some(staged) => staged.clone(),
            None => self.store.group(key),
        }
    }

    /// Require `key` to exist, now and at commit
    ///
    /// Returns the group record. A group created earlier in this same
    /// transaction satisfies the requirement without a commit-time check.
    pub fn require_group(&mut self, key: &GroupKey) -> Result<GroupRecord, RegistryError> {
        if let Some(staged) = self.staged_groups.get(key) {
            return staged
                .clone()
                .ok_or_else(|| RegistryError::not_found(key.clone()));
        }
        let group = self
            .store
            .group(key)
            .ok_or_else(|| RegistryError::not_found(key.clone()))?;
        self.expect(Expectation::GroupExists(key.clone()));
        Ok(group)
    }

    /// Record a fact to re-check at commit
    pub fn expect(&mut self, expectation: Expectation) {
        if !self.expectations.contains(&expectation) {
            self.expectations.push(expectation);
        }
    }

    // === Writes ===

    /// Stage a resource record (meta and every version)
    pub fn put_resource(&mut self, record: ResourceRecord) -> Result<(), RegistryError> {
        self.ensure_active()?;
        self.staged_resources
            .insert(record.key.clone(), Some(record.clone()));
        self.writeset.push(Mutation::PutResource(record));
        Ok(())
    }

    /// Stage deletion of a resource
    pub fn delete_resource(&mut self, key: ResourceKey) -> Result<(), RegistryError> {
        self.ensure_active()?;
        self.staged_resources.insert(key.clone(), None);
        self.writeset.push(Mutation::DeleteResource(key));
        Ok(())
    }

    /// Stage a group record
    pub fn put_group(&mut self, record: GroupRecord) -> Result<(), RegistryError> {
        self.ensure_active()?;
        self.staged_groups
            .insert(record.key.clone(), Some(record.clone()));
        self.writeset.push(Mutation::PutGroup(record));
        Ok(())
    }

    /// Stage deletion of a group with all of its resources
    pub fn delete_group(&mut self, key: GroupKey) -> Result<(), RegistryError> {
        self.ensure_active()?;
        self.staged_groups.insert(key.clone(), None);
        self.staged_resources.retain(|k, _| k.group != key);
        self.writeset.push(Mutation::DeleteGroup(key));
        Ok(())
    }

    /// Stage an epoch bump of a group at the transaction time
    pub fn bump_group(&mut self, key: GroupKey) -> Result<(), RegistryError> {
        self.ensure_active()?;
        self.writeset.push(Mutation::BumpGroup { key, at: self.now });
        Ok(())
    }

    /// Stage an epoch bump of the registry at the transaction time
    pub fn bump_registry(&mut self) -> Result<(), RegistryError> {
        self.ensure_active()?;
        self.writeset.push(Mutation::BumpRegistry { at: self.now });
        Ok(())
    }

    // === State ===

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if transaction can accept operations
    pub fn ensure_active(&self) -> Result<(), RegistryError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(RegistryError::internal(format!(
                "Transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Get summary of pending operations
    pub fn pending_operations(&self) -> PendingOperations {
        let mut pending = PendingOperations::default();
        for m in self.writeset.mutations() {
            match m {
                Mutation::PutResource(_) | Mutation::PutGroup(_) => pending.puts += 1,
                Mutation::DeleteResource(_) | Mutation::DeleteGroup(_) => pending.deletes += 1,
                Mutation::BumpGroup { .. } | Mutation::BumpRegistry { .. } => pending.bumps += 1,
            }
        }
        pending
    }

    /// Abort the transaction, discarding every buffered operation
    pub fn abort(&mut self, reason: impl Into<String>) {
        if !self.is_active() {
            return;
        }
        let reason = reason.into();
        debug!(
            target: "xreg::txn",
            txn_id = self.txn_id,
            discarded = self.writeset.len(),
            reason = %reason,
            "Transaction aborted"
        );
        self.writeset.clear();
        self.staged_resources.clear();
        self.staged_groups.clear();
        self.expectations.clear();
        self.status = TransactionStatus::Aborted { reason };
    }

    // === Commit Operation ===

    /// Commit the transaction
    ///
    /// Checks every expectation and applies the writeset under the store's
    /// write lock. On validation failure the transaction is aborted and
    /// nothing is applied.
    pub fn commit(&mut self) -> Result<u64, CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "Cannot commit transaction {} from {:?} state - must be Active",
                self.txn_id, self.status
            )));
        }

        let writeset = std::mem::take(&mut self.writeset);
        let mutations = writeset.len();
        let expectations = std::mem::take(&mut self.expectations);
        let result = self.store.apply_checked(writeset, |state| {
            expectations.iter().try_for_each(|e| e.check(state))
        });

        match result {
            Ok(version) => {
                self.status = TransactionStatus::Committed;
                self.staged_resources.clear();
                self.staged_groups.clear();
                debug!(
                    target: "xreg::txn",
                    txn_id = self.txn_id,
                    version,
                    mutations,
                    "Transaction committed"
                );
                Ok(version)
            }
            Err(e) => {
                self.abort(e.to_string());
                Err(CommitError::ValidationFailed(e))
            }
        }
    }
}
