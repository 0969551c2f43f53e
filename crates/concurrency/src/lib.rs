//! Concurrency layer for the registry
//!
//! This crate implements transaction handling with:
//! - TransactionContext: buffered writes with read-your-writes
//! - Commit-time validation of the state a transaction relied on
//! - Per-entity lock table for serializing writers of one resource
//! - A strictly monotonic transaction clock

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;

pub use manager::{LockKey, TransactionManager};
pub use transaction::{
    CommitError, Expectation, PendingOperations, TransactionContext, TransactionStatus,
};
