//! RegistryStore: committed registry state
//!
//! This module holds the committed state of one registry using:
//! - `BTreeMap`s keyed by address for ordered listing
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` commit version, incremented once per applied writeset
//!
//! # Design Notes
//!
//! - **Whole-record reads**: readers get clones; nothing outside the store
//!   ever holds a reference into it
//! - **Atomic apply**: a writeset is applied entirely under one write lock,
//!   so readers never observe half of a transaction

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use xreg_core::{GroupKey, GroupRecord, RegistryRecord, ResourceKey, ResourceRecord};

use crate::writeset::{Mutation, Writeset};

/// Everything the store holds, as one value
///
/// Used as the unit of snapshotting.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    /// The registry record
    pub registry: RegistryRecord,
    /// Groups by address
    pub groups: BTreeMap<GroupKey, GroupRecord>,
    /// Resources by address
    pub resources: BTreeMap<ResourceKey, ResourceRecord>,
}

impl StoreState {
    /// Empty state around a registry record
    pub fn new(registry: RegistryRecord) -> Self {
        Self {
            registry,
            groups: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::PutResource(record) => {
                self.resources.insert(record.key.clone(), record);
            }
            Mutation::DeleteResource(key) => {
                self.resources.remove(&key);
            }
            Mutation::PutGroup(record) => {
                self.groups.insert(record.key.clone(), record);
            }
            Mutation::DeleteGroup(key) => {
                self.groups.remove(&key);
                self.resources.retain(|k, _| k.group != key);
            }
            Mutation::BumpGroup { key, at } => {
                if let Some(group) = self.groups.get_mut(&key) {
                    group.stamps.bump(at);
                }
            }
            Mutation::BumpRegistry { at } => {
                self.registry.stamps.bump(at);
            }
        }
    }
}

/// Committed registry state
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
#[derive(Debug)]
pub struct RegistryStore {
    state: RwLock<StoreState>,
    /// Number of writesets applied so far
    version: AtomicU64,
}

impl RegistryStore {
    /// Create a store holding only the registry record
    pub fn new(registry: RegistryRecord) -> Self {
        Self::from_state(StoreState::new(registry), 0)
    }

    /// Create a store from previously captured state
    pub fn from_state(state: StoreState, version: u64) -> Self {
        Self {
            state: RwLock::new(state),
            version: AtomicU64::new(version),
        }
    }

    /// Current commit version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// The registry record
    pub fn registry(&self) -> RegistryRecord {
        self.state.read().registry.clone()
    }

    /// A group record
    pub fn group(&self, key: &GroupKey) -> Option<GroupRecord> {
        self.state.read().groups.get(key).cloned()
    }

    /// All groups of one type, in ID order
    pub fn groups_of_type(&self, group_type: &str) -> Vec<GroupRecord> {
        self.state
            .read()
            .groups
            .values()
            .filter(|g| g.key.group_type == group_type)
            .cloned()
            .collect()
    }

    /// Group count per group type
    pub fn group_counts(&self) -> BTreeMap<String, usize> {
        let state = self.state.read();
        let mut counts = BTreeMap::new();
        for key in state.groups.keys() {
            *counts.entry(key.group_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// A resource record
    pub fn resource(&self, key: &ResourceKey) -> Option<ResourceRecord> {
        self.state.read().resources.get(key).cloned()
    }

    /// Keys of every resource in a group, in address order
    pub fn resource_keys_in_group(&self, group: &GroupKey) -> Vec<ResourceKey> {
        self.state
            .read()
            .resources
            .keys()
            .filter(|k| &k.group == group)
            .cloned()
            .collect()
    }

    /// Keys of every resource of one type across all groups of one type
    pub fn resource_keys_of_type(&self, group_type: &str, resource_type: &str) -> Vec<ResourceKey> {
        self.state
            .read()
            .resources
            .keys()
            .filter(|k| k.group.group_type == group_type && k.resource_type == resource_type)
            .cloned()
            .collect()
    }

    /// Resource count per resource type within one group
    pub fn resource_counts(&self, group: &GroupKey) -> BTreeMap<String, usize> {
        let state = self.state.read();
        let mut counts = BTreeMap::new();
        for key in state.resources.keys().filter(|k| &k.group == group) {
            *counts.entry(key.resource_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Apply a writeset atomically
    ///
    /// Returns the new commit version. An empty writeset does not advance it.
    pub fn apply(&self, writeset: Writeset) -> u64 {
        match self.apply_checked(writeset, |_| Ok::<(), ()>(())) {
            Ok(version) => version,
            Err(()) => self.current_version(),
        }
    }

    /// Validate against committed state, then apply, under one write lock
    ///
    /// `check` sees the state exactly as the writeset will be applied to it.
    /// When it fails nothing is applied and its error is returned.
    pub fn apply_checked<E>(
        &self,
        writeset: Writeset,
        check: impl FnOnce(&StoreState) -> Result<(), E>,
    ) -> Result<u64, E> {
        let mut state = self.state.write();
        check(&state)?;
        if writeset.is_empty() {
            return Ok(self.current_version());
        }
        let count = writeset.len();
        for mutation in writeset.into_mutations() {
            state.apply(mutation);
        }
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(target: "xreg::store", version, mutations = count, "Applied writeset");
        Ok(version)
    }

    /// Clone the complete state with the commit version it corresponds to
    pub fn capture(&self) -> (StoreState, u64) {
        let state = self.state.read();
        (state.clone(), self.current_version())
    }
}
