//! Storage layer for the registry
//!
//! This crate holds committed registry state:
//! - RegistryStore: BTreeMap-based state behind an RwLock
//! - Writeset: the mutations one transaction applies atomically
//! - Version management with AtomicU64
//! - JSON snapshots written with temp-file + rename

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod store;
pub mod writeset;

pub use snapshot::{
    load_snapshot, save_snapshot, snapshot_path, SnapshotError, StoreSnapshot,
    SNAPSHOT_FILE_NAME, SNAPSHOT_FORMAT_VERSION,
};
pub use store::{RegistryStore, StoreState};
pub use writeset::{Mutation, Writeset};
