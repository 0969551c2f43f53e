//! Transaction coordinator for managing transaction lifecycle
//!
//! The TransactionCoordinator wraps TransactionManager and adds:
//! - Active transaction tracking
//! - Transaction metrics (started, committed, aborted)
//! - Conversion of commit failures into `RegistryError`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use xreg_concurrency::{LockKey, TransactionContext, TransactionManager};
use xreg_core::{RegistryError, Result, Timestamp};
use xreg_storage::RegistryStore;

/// Transaction coordinator for the registry
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering. They are observational only
/// and do not synchronize any other memory.
pub struct TransactionCoordinator {
    /// Transaction ids, clock and per-entity locks
    manager: TransactionManager,
    active_count: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_aborted: AtomicU64,
}

impl TransactionCoordinator {
    /// Coordinator whose clock starts after `last`
    ///
    /// Pass the newest stamp found in restored state so new stamps never go
    /// backwards across restarts.
    pub fn new(last: Timestamp) -> Self {
        Self {
            manager: TransactionManager::with_clock(last),
            active_count: AtomicU64::new(0),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
        }
    }

    /// Start a new transaction over `store`
    pub fn start_transaction(&self, store: &Arc<RegistryStore>) -> TransactionContext {
        let txn = self.manager.begin(Arc::clone(store));
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
        txn
    }

    /// Commit a transaction
    ///
    /// Records commit or abort metrics and converts `CommitError`.
    pub fn commit(&self, txn: &mut TransactionContext) -> Result<u64> {
        match self.manager.commit(txn) {
            Ok(version) => {
                self.record_commit();
                debug!(target: "xreg::txn", txn_id = txn.txn_id, version, "Transaction committed");
                Ok(version)
            }
            Err(e) => {
                self.record_abort();
                warn!(target: "xreg::txn", txn_id = txn.txn_id, error = %e, "Transaction aborted");
                Err(RegistryError::from(e))
            }
        }
    }

    /// Abort a transaction after its closure failed
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) {
        txn.abort(reason);
        self.record_abort();
    }

    /// Record transaction commit
    ///
    /// Decrements active count (saturating at 0) and increments committed count.
    pub fn record_commit(&self) {
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record transaction abort
    pub fn record_abort(&self) {
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Lock serializing writers of one entity
    pub fn lock_for(&self, key: impl Into<LockKey>) -> Arc<Mutex<()>> {
        self.manager.lock_for(key)
    }

    /// Drop lock entries nobody holds
    pub fn prune_locks(&self) -> usize {
        self.manager.prune_locks()
    }

    /// Get transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }

    /// Get current active transaction count
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait for all active transactions to complete
    ///
    /// Returns `false` if `timeout` expired with transactions still active.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        let sleep_duration = Duration::from_millis(1);

        while self.active_count.load(Ordering::SeqCst) > 0 {
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(sleep_duration);
        }
        true
    }
}

/// Transaction metrics
#[derive(Debug, Clone)]
pub struct TransactionMetrics {
    /// Number of currently active transactions
    pub active_count: u64,
    /// Total number of transactions started
    pub total_started: u64,
    /// Total number of transactions committed
    pub total_committed: u64,
    /// Total number of transactions aborted
    pub total_aborted: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Total transactions that completed (committed + aborted)
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }

    /// Abort rate (aborted / started)
    pub fn abort_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_aborted as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}
