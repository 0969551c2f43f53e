//! Registry struct and open/close logic
//!
//! This module provides the `Registry` handle that orchestrates:
//! - Configuration and model (`xregistry.toml`)
//! - Committed state and its JSON snapshot
//! - Transactions and per-entity locking
//! - Every Group, Resource, Meta and Version operation
//!
//! ## Locking
//!
//! A mutation takes the model read lock, then the lock of the entity it
//! writes (the Group for group create/delete, the Resource otherwise), and
//! holds both until its transaction has committed. Model updates take the
//! model write lock, so no mutation runs against a model being replaced.
//! Writes that rely on their Group existing re-check it at commit time.

pub mod config;
mod registry;

pub use config::{RegistryConfig, CONFIG_FILE_NAME};
pub use registry::OPEN_REGISTRIES;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use xreg_concurrency::{Expectation, TransactionContext};
use xreg_core::{
    Attributes, EntityPath, GroupKey, GroupRecord, GroupView, MetaUpdate, MetaView,
    RegistryError, RegistryModel, RegistryRecord, RegistryView, ResourceKey, ResourceModel,
    ResourceRecord, ResourceView, Result, Stamps, Timestamp, VersionId, VersionProposal,
    VersionView, WriteOptions,
};
use xreg_storage::{load_snapshot, save_snapshot, RegistryStore, StoreSnapshot, StoreState};

use crate::ancestry::VersionAncestor;
use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use crate::resource::{ResourceChange, ResourceEngine};

/// Controls whether state lives on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum PersistenceMode {
    /// No files at all; state is lost on drop
    Ephemeral,
    /// Config and snapshot live in the data directory
    #[default]
    Disk,
}

/// Result of a version write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionsWritten {
    /// The write created the resource
    pub resource_created: bool,
    /// Written versions that survived retention, in request order
    pub versions: Vec<VersionView>,
    /// Versions removed by retention
    pub pruned: Vec<VersionId>,
    /// Default version after the write
    pub default_version_id: VersionId,
}

/// Main registry handle
///
/// Create one with `Registry::open()` or `Registry::ephemeral()`.
///
/// # Example
///
/// ```text
/// use xreg_engine::Registry;
///
/// let reg = Registry::open("/path/to/data")?;
/// reg.create_group(group_key, Attributes::new())?;
/// reg.create_or_update_versions(&key, batch, &WriteOptions::default())?;
/// ```
pub struct Registry {
    /// Data directory (empty for ephemeral registries)
    data_dir: PathBuf,
    persistence_mode: PersistenceMode,
    /// Committed state
    store: Arc<RegistryStore>,
    /// Transaction lifecycle, clock, entity locks and metrics
    coordinator: TransactionCoordinator,
    /// Model in force
    model: RwLock<RegistryModel>,
    /// Settings mirrored in `xregistry.toml`
    config: RwLock<RegistryConfig>,
    /// Cleared on shutdown
    accepting_transactions: AtomicBool,
}

impl Registry {
    /// Open the registry stored in `path`
    ///
    /// Reads `xregistry.toml`, writing the default one first if the
    /// directory has none, and restores the snapshot when present.
    ///
    /// Opening the same path twice returns the same `Arc<Registry>`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir).map_err(|e| RegistryError::storage(e.to_string()))?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        RegistryConfig::write_default_if_missing(&config_path)?;
        let cfg = RegistryConfig::from_file(&config_path)?;

        Self::open_with_config(path, cfg)
    }

    /// Open the registry in `path` with an explicit configuration
    ///
    /// The configuration is written to `xregistry.toml` so later `open()`
    /// calls pick it up.
    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: RegistryConfig) -> Result<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir).map_err(|e| RegistryError::storage(e.to_string()))?;
        cfg.validate()?;

        let mut open = OPEN_REGISTRIES.lock();
        if let Some(existing) = open.get(&data_dir).and_then(|weak| weak.upgrade()) {
            debug!(target: "xreg::db", path = %data_dir.display(), "Registry already open");
            return Ok(existing);
        }

        let (store, last_stamp, cfg) = Self::restore(&data_dir, cfg)?;
        cfg.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;

        let reg = Arc::new(Self::build(
            data_dir.clone(),
            PersistenceMode::Disk,
            store,
            last_stamp,
            cfg,
        ));
        open.insert(data_dir.clone(), Arc::downgrade(&reg));

        info!(
            target: "xreg::db",
            path = %data_dir.display(),
            registry_id = %reg.store.registry().id,
            "Registry opened"
        );
        Ok(reg)
    }

    /// In-memory registry with the default model
    pub fn ephemeral() -> Result<Arc<Self>> {
        Self::ephemeral_with_model(RegistryModel::default_model())
    }

    /// In-memory registry with the given model
    pub fn ephemeral_with_model(model: RegistryModel) -> Result<Arc<Self>> {
        let mut cfg = RegistryConfig::with_model(model);
        cfg.snapshot = false;
        cfg.validate()?;

        let now = Timestamp::now();
        let id = Uuid::new_v4().to_string();
        cfg.registry_id = Some(id.clone());
        let store = RegistryStore::new(RegistryRecord {
            id,
            stamps: Stamps::created(now),
        });
        Ok(Arc::new(Self::build(
            PathBuf::new(),
            PersistenceMode::Ephemeral,
            store,
            now,
            cfg,
        )))
    }

    fn build(
        data_dir: PathBuf,
        persistence_mode: PersistenceMode,
        store: RegistryStore,
        last_stamp: Timestamp,
        cfg: RegistryConfig,
    ) -> Self {
        Self {
            data_dir,
            persistence_mode,
            store: Arc::new(store),
            coordinator: TransactionCoordinator::new(last_stamp),
            model: RwLock::new(cfg.model()),
            config: RwLock::new(cfg),
            accepting_transactions: AtomicBool::new(true),
        }
    }

    /// Load the snapshot in `data_dir`, or start a fresh registry
    ///
    /// Returns the store, the newest stamp in it and the config with its
    /// registry id filled in.
    fn restore(
        data_dir: &Path,
        mut cfg: RegistryConfig,
    ) -> Result<(RegistryStore, Timestamp, RegistryConfig)> {
        match load_snapshot(data_dir)? {
            Some(snapshot) => {
                let (state, version, snapshot_model) = snapshot.into_state();
                if snapshot_model != cfg.model() {
                    warn!(
                        target: "xreg::db",
                        path = %data_dir.display(),
                        "Snapshot model differs from {}, using the config file",
                        CONFIG_FILE_NAME
                    );
                }
                cfg.registry_id = Some(state.registry.id.clone());
                let last = latest_stamp(&state);
                info!(
                    target: "xreg::db",
                    groups = state.groups.len(),
                    resources = state.resources.len(),
                    "Restored registry state"
                );
                Ok((RegistryStore::from_state(state, version), last, cfg))
            }
            None => {
                let id = cfg
                    .registry_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                cfg.registry_id = Some(id.clone());
                let now = Timestamp::now();
                let store = RegistryStore::new(RegistryRecord {
                    id,
                    stamps: Stamps::created(now),
                });
                Ok((store, now, cfg))
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Data directory; empty for ephemeral registries
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Whether this registry keeps no files
    pub fn is_ephemeral(&self) -> bool {
        self.persistence_mode == PersistenceMode::Ephemeral
    }

    /// Whether new operations are accepted
    pub fn is_open(&self) -> bool {
        self.accepting_transactions.load(Ordering::SeqCst)
    }

    /// Current configuration
    pub fn config(&self) -> RegistryConfig {
        self.config.read().clone()
    }

    /// Model in force
    pub fn model(&self) -> RegistryModel {
        self.model.read().clone()
    }

    /// Transaction statistics
    pub fn transaction_metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// Number of commits applied since the state was created or restored
    pub fn commit_version(&self) -> u64 {
        self.store.current_version()
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    fn check_accepting(&self) -> Result<()> {
        if !self.is_open() {
            return Err(RegistryError::invalid_input("Registry is shutting down"));
        }
        Ok(())
    }

    /// Run `f` in a transaction: commit on success, abort on error
    ///
    /// The caller holds the locks of every entity `f` writes.
    pub(crate) fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T>,
    {
        self.check_accepting()?;
        let mut txn = self.coordinator.start_transaction(&self.store);
        match f(&mut txn) {
            Ok(value) => {
                self.coordinator.commit(&mut txn)?;
                Ok(value)
            }
            Err(e) => {
                self.coordinator.abort(&mut txn, format!("Closure error: {}", e));
                Err(e)
            }
        }
    }

    /// Stage the outcome of a resource operation
    fn stage(txn: &mut TransactionContext, key: &ResourceKey, change: &ResourceChange) -> Result<()> {
        match &change.record {
            Some(record) => txn.put_resource(record.clone())?,
            None => txn.delete_resource(key.clone())?,
        }
        if change.cascade.group_touched() {
            txn.bump_group(key.group.clone())?;
        }
        if change.cascade.registry_touched() {
            txn.bump_registry()?;
        }
        Ok(())
    }

    /// Run one resource operation under the resource lock
    ///
    /// `op` receives the resource's model, the stored record (if any) and
    /// the transaction time.
    fn mutate_resource<F>(&self, key: &ResourceKey, op: F) -> Result<ResourceChange>
    where
        F: FnOnce(&ResourceEngine<'_>, Option<ResourceRecord>) -> Result<ResourceChange>,
    {
        let model = self.model.read();
        let resource_model = lookup_resource_model(&model, key)?;
        let lock = self.coordinator.lock_for(key.clone());
        let _guard = lock.lock();

        self.transaction(|txn| {
            txn.require_group(&key.group)?;
            let existing = txn.get_resource(key);
            let engine = ResourceEngine::new(key, resource_model, txn.now);
            let change = op(&engine, existing)?;
            Self::stage(txn, key, &change)?;
            Ok(change)
        })
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// The Registry entity with its group counts
    pub fn get_registry(&self) -> RegistryView {
        let model = self.model.read();
        let stored = self.store.group_counts();
        let group_counts = model
            .groups
            .keys()
            .map(|plural| (plural.clone(), stored.get(plural).copied().unwrap_or(0)))
            .collect();
        RegistryView {
            record: self.store.registry(),
            group_counts,
        }
    }

    /// Replace the model
    ///
    /// Existing data is checked first: a group or resource type that still
    /// has instances can't be removed, and `single_version_root` can't be
    /// turned on while a resource of that type has several roots. After the
    /// model is saved, lowered retention caps are applied to every existing
    /// resource of the affected types.
    pub fn update_model(&self, new_model: RegistryModel) -> Result<()> {
        self.check_accepting()?;
        new_model
            .validate()
            .map_err(|reason| RegistryError::invalid_input(format!("invalid model: {}", reason)))?;

        let mut model = self.model.write();
        self.check_model_change(&model, &new_model)?;

        if self.persistence_mode == PersistenceMode::Disk {
            let mut cfg = self.config.write();
            cfg.set_model(new_model.clone());
            cfg.write_to_file(&self.data_dir.join(CONFIG_FILE_NAME))?;
        } else {
            self.config.write().set_model(new_model.clone());
        }
        *model = new_model;
        info!(target: "xreg::db", groups = model.groups.len(), "Model updated");

        for (group_type, group) in &model.groups {
            for (resource_type, resource_model) in &group.resources {
                if resource_model.max_versions == 0 {
                    continue;
                }
                for key in self.store.resource_keys_of_type(group_type, resource_type) {
                    self.enforce_retention(&key, resource_model)?;
                }
            }
        }
        Ok(())
    }

    fn check_model_change(&self, current: &RegistryModel, new_model: &RegistryModel) -> Result<()> {
        for (group_type, group) in &current.groups {
            let Some(new_group) = new_model.group(group_type) else {
                if !self.store.groups_of_type(group_type).is_empty() {
                    return Err(RegistryError::bad_request(
                        EntityPath::Registry,
                        format!("group type '{}' can't be removed while it has groups", group_type),
                    ));
                }
                continue;
            };
            for resource_type in group.resources.keys() {
                if !new_group.resources.contains_key(resource_type)
                    && !self
                        .store
                        .resource_keys_of_type(group_type, resource_type)
                        .is_empty()
                {
                    return Err(RegistryError::bad_request(
                        EntityPath::Registry,
                        format!(
                            "resource type '{}/{}' can't be removed while it has resources",
                            group_type, resource_type
                        ),
                    ));
                }
            }
        }

        for (group_type, group) in &new_model.groups {
            for (resource_type, resource_model) in &group.resources {
                if !resource_model.single_version_root {
                    continue;
                }
                for key in self.store.resource_keys_of_type(group_type, resource_type) {
                    let Some(record) = self.store.resource(&key) else {
                        continue;
                    };
                    let roots = ResourceEngine::new(&key, resource_model, Timestamp::EPOCH)
                        .root_count(&record);
                    if roots > 1 {
                        return Err(RegistryError::TooManyRootVersions {
                            subject: EntityPath::Resource(key),
                            count: roots,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Prune one resource to a lowered cap; the caller holds the model lock
    fn enforce_retention(&self, key: &ResourceKey, resource_model: &ResourceModel) -> Result<()> {
        let lock = self.coordinator.lock_for(key.clone());
        let _guard = lock.lock();
        let pruned = self.transaction(|txn| {
            let Some(record) = txn.get_resource(key) else {
                return Ok(Vec::new());
            };
            let change = ResourceEngine::new(key, resource_model, txn.now).enforce_retention(record)?;
            if !change.pruned.is_empty() {
                Self::stage(txn, key, &change)?;
            }
            Ok(change.pruned)
        })?;
        if !pruned.is_empty() {
            info!(target: "xreg::db", resource = %key, pruned = ?pruned, "Applied lowered retention cap");
        }
        Ok(())
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Create an empty group
    pub fn create_group(&self, key: GroupKey, attributes: Attributes) -> Result<GroupView> {
        let model = self.model.read();
        check_group_type(&model, &key)?;
        let lock = self.coordinator.lock_for(key.clone());
        let _guard = lock.lock();

        let record = self.transaction(|txn| {
            if txn.get_group(&key).is_some() {
                return Err(RegistryError::AlreadyExists {
                    subject: EntityPath::Group(key.clone()),
                });
            }
            txn.expect(Expectation::GroupAbsent(key.clone()));
            let record = GroupRecord {
                key: key.clone(),
                stamps: Stamps::created(txn.now),
                attributes,
            };
            txn.put_group(record.clone())?;
            txn.bump_registry()?;
            Ok(record)
        })?;
        debug!(target: "xreg::db", group = %key, "Group created");
        Ok(self.group_view(&model, record))
    }

    /// A group with its resource counts
    pub fn get_group(&self, key: &GroupKey) -> Result<GroupView> {
        let model = self.model.read();
        check_group_type(&model, key)?;
        let record = self
            .store
            .group(key)
            .ok_or_else(|| RegistryError::not_found(key.clone()))?;
        Ok(self.group_view(&model, record))
    }

    /// Every group of one type, ordered by ID
    pub fn list_groups(&self, group_type: &str) -> Result<Vec<GroupView>> {
        let model = self.model.read();
        if model.group(group_type).is_none() {
            return Err(unknown_type(group_type));
        }
        Ok(self
            .store
            .groups_of_type(group_type)
            .into_iter()
            .map(|record| self.group_view(&model, record))
            .collect())
    }

    /// Delete a group with every resource in it
    pub fn delete_group(&self, key: &GroupKey) -> Result<()> {
        let model = self.model.read();
        check_group_type(&model, key)?;
        let lock = self.coordinator.lock_for(key.clone());
        let _guard = lock.lock();

        self.transaction(|txn| {
            if txn.get_group(key).is_none() {
                return Err(RegistryError::not_found(key.clone()));
            }
            txn.delete_group(key.clone())?;
            txn.bump_registry()?;
            Ok(())
        })?;
        drop(_guard);
        drop(lock);
        let pruned = self.coordinator.prune_locks();
        debug!(target: "xreg::db", group = %key, locks_pruned = pruned, "Group deleted");
        Ok(())
    }

    fn group_view(&self, model: &RegistryModel, record: GroupRecord) -> GroupView {
        let stored = self.store.resource_counts(&record.key);
        let resource_counts = model
            .group(&record.key.group_type)
            .map(|g| {
                g.resources
                    .keys()
                    .map(|plural| (plural.clone(), stored.get(plural).copied().unwrap_or(0)))
                    .collect()
            })
            .unwrap_or_else(BTreeMap::new);
        GroupView {
            record,
            resource_counts,
        }
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// A resource: its default version, version count and meta
    pub fn get_resource(&self, key: &ResourceKey) -> Result<ResourceView> {
        let record = self.read_resource(key)?;
        resource_view(&record)
    }

    /// Every resource of one type in a group, ordered by ID
    pub fn list_resources(&self, group: &GroupKey, resource_type: &str) -> Result<Vec<ResourceView>> {
        {
            let model = self.model.read();
            check_group_type(&model, group)?;
            if model.resource(&group.group_type, resource_type).is_none() {
                return Err(unknown_type(resource_type));
            }
        }
        if self.store.group(group).is_none() {
            return Err(RegistryError::not_found(group.clone()));
        }
        self.store
            .resource_keys_in_group(group)
            .into_iter()
            .filter(|key| key.resource_type == resource_type)
            .filter_map(|key| self.store.resource(&key))
            .map(|record| resource_view(&record))
            .collect()
    }

    /// Delete a resource with all of its versions
    pub fn delete_resource(&self, key: &ResourceKey) -> Result<()> {
        let model = self.model.read();
        lookup_resource_model(&model, key)?;
        let lock = self.coordinator.lock_for(key.clone());
        let _guard = lock.lock();

        self.transaction(|txn| {
            if txn.get_resource(key).is_none() {
                return Err(RegistryError::not_found(key.clone()));
            }
            txn.delete_resource(key.clone())?;
            txn.bump_group(key.group.clone())?;
            txn.bump_registry()?;
            Ok(())
        })?;
        debug!(target: "xreg::db", resource = %key, "Resource deleted");
        Ok(())
    }

    fn read_resource(&self, key: &ResourceKey) -> Result<ResourceRecord> {
        {
            let model = self.model.read();
            lookup_resource_model(&model, key)?;
        }
        self.store
            .resource(key)
            .ok_or_else(|| RegistryError::not_found(key.clone()))
    }

    // ========================================================================
    // Versions
    // ========================================================================

    /// Create or update a batch of versions, creating the resource if needed
    pub fn create_or_update_versions(
        &self,
        key: &ResourceKey,
        batch: Vec<(VersionId, VersionProposal)>,
        options: &WriteOptions,
    ) -> Result<VersionsWritten> {
        let change =
            self.mutate_resource(key, |engine, existing| engine.write_versions(existing, batch, options))?;
        written(&change)
    }

    /// Create one version under a server-generated ID
    pub fn create_version(
        &self,
        key: &ResourceKey,
        proposal: VersionProposal,
        options: &WriteOptions,
    ) -> Result<VersionsWritten> {
        let change = self.mutate_resource(key, |engine, existing| {
            engine
                .create_version(existing, proposal, options)
                .map(|(_, change)| change)
        })?;
        written(&change)
    }

    /// One version
    pub fn get_version(&self, key: &ResourceKey, id: &VersionId) -> Result<VersionView> {
        let record = self.read_resource(key)?;
        let version = record
            .versions
            .get(id)
            .ok_or_else(|| RegistryError::not_found(EntityPath::version(key.clone(), id.clone())))?;
        Ok(VersionView {
            record: version.clone(),
            is_default: record.is_default(id),
        })
    }

    /// Every version in ancestor-respecting order
    pub fn list_versions(&self, key: &ResourceKey) -> Result<Vec<VersionView>> {
        let record = self.read_resource(key)?;
        let order = self.ordered_from_record(key, &record)?;
        order
            .iter()
            .map(|entry| {
                record
                    .versions
                    .get(&entry.id)
                    .map(|version| VersionView {
                        record: version.clone(),
                        is_default: record.is_default(&entry.id),
                    })
                    .ok_or_else(|| RegistryError::GraphInvalid {
                        subject: EntityPath::Resource(key.clone()),
                        reason: format!("ordered version '{}' is not stored", entry.id),
                    })
            })
            .collect()
    }

    /// `{id, ancestor, position}` for every version, in order
    pub fn ordered_versions(&self, key: &ResourceKey) -> Result<Vec<VersionAncestor>> {
        let record = self.read_resource(key)?;
        self.ordered_from_record(key, &record)
    }

    fn ordered_from_record(
        &self,
        key: &ResourceKey,
        record: &ResourceRecord,
    ) -> Result<Vec<VersionAncestor>> {
        let model = self.model.read();
        let resource_model = lookup_resource_model(&model, key)?;
        ResourceEngine::new(key, resource_model, Timestamp::EPOCH).ordered(record)
    }

    /// Delete versions, optionally pinning a replacement default
    ///
    /// Returns `None` when the last version was deleted and the resource
    /// went with it.
    pub fn delete_versions(
        &self,
        key: &ResourceKey,
        ids: &[VersionId],
        new_default: Option<&VersionId>,
    ) -> Result<Option<ResourceView>> {
        let change = self.mutate_resource(key, |engine, existing| {
            let record = existing.ok_or_else(|| RegistryError::not_found(key.clone()))?;
            engine.delete_versions(record, ids, new_default)
        })?;
        change.record.as_ref().map(resource_view).transpose()
    }

    // ========================================================================
    // Meta
    // ========================================================================

    /// A resource's meta with its version count
    pub fn get_meta(&self, key: &ResourceKey) -> Result<MetaView> {
        let record = self.read_resource(key)?;
        Ok(meta_view(&record))
    }

    /// Update the default version pointer and mode
    pub fn update_meta(&self, key: &ResourceKey, update: &MetaUpdate) -> Result<MetaView> {
        let change = self.mutate_resource(key, |engine, existing| {
            let record = existing.ok_or_else(|| RegistryError::not_found(key.clone()))?;
            engine.update_meta(record, update)
        })?;
        changed_record(key, &change).map(meta_view)
    }

    /// Switch default-version stickiness, optionally naming the version to pin
    pub fn set_default_version_sticky(
        &self,
        key: &ResourceKey,
        sticky: bool,
        id: Option<VersionId>,
    ) -> Result<MetaView> {
        let change = self.mutate_resource(key, |engine, existing| {
            let record = existing.ok_or_else(|| RegistryError::not_found(key.clone()))?;
            engine.set_default_version_sticky(record, sticky, id)
        })?;
        changed_record(key, &change).map(meta_view)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the snapshot, if this registry keeps one
    pub fn flush(&self) -> Result<()> {
        if self.persistence_mode == PersistenceMode::Ephemeral || !self.config.read().snapshot {
            return Ok(());
        }
        let (state, version) = self.store.capture();
        let snapshot = StoreSnapshot::capture(state, version, self.model());
        save_snapshot(&self.data_dir, &snapshot)?;
        Ok(())
    }

    /// Stop accepting operations, wait for in-flight ones and flush
    pub fn shutdown(&self) -> Result<()> {
        self.accepting_transactions.store(false, Ordering::SeqCst);
        if !self.coordinator.wait_for_idle(Duration::from_secs(30)) {
            warn!(target: "xreg::db", "Transactions still active at shutdown");
        }
        self.flush()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(target: "xreg::db", error = %e, "Final flush failed");
        }
        if self.persistence_mode == PersistenceMode::Disk && !self.data_dir.as_os_str().is_empty() {
            // The directory may already be re-opened under a live handle.
            let mut open = OPEN_REGISTRIES.lock();
            if open.get(&self.data_dir).map_or(false, |weak| weak.strong_count() == 0) {
                open.remove(&self.data_dir);
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Newest `modified_at` in restored state
///
/// `created_at` is ignored: clients may supply it and it may lie in the
/// future.
fn latest_stamp(state: &StoreState) -> Timestamp {
    let groups = state.groups.values().map(|g| g.stamps.modified_at);
    let resources = state.resources.values().flat_map(|r| {
        std::iter::once(r.meta.stamps.modified_at)
            .chain(r.versions.values().map(|v| v.stamps.modified_at))
    });
    groups
        .chain(resources)
        .fold(state.registry.stamps.modified_at, Timestamp::max)
}

fn unknown_type(name: &str) -> RegistryError {
    RegistryError::bad_request(EntityPath::Registry, format!("unknown type '{}'", name))
}

fn check_group_type(model: &RegistryModel, key: &GroupKey) -> Result<()> {
    if model.group(&key.group_type).is_none() {
        return Err(RegistryError::not_found(key.clone()));
    }
    Ok(())
}

fn lookup_resource_model<'m>(model: &'m RegistryModel, key: &ResourceKey) -> Result<&'m ResourceModel> {
    model
        .resource(&key.group.group_type, &key.resource_type)
        .ok_or_else(|| RegistryError::not_found(key.clone()))
}

fn resource_view(record: &ResourceRecord) -> Result<ResourceView> {
    ResourceView::from_record(record).ok_or_else(|| RegistryError::GraphInvalid {
        subject: EntityPath::Resource(record.key.clone()),
        reason: format!(
            "default version '{}' is not stored",
            record.meta.default_version_id
        ),
    })
}

fn meta_view(record: &ResourceRecord) -> MetaView {
    MetaView {
        record: record.meta.clone(),
        versions_count: record.versions_count(),
    }
}

fn changed_record<'c>(key: &ResourceKey, change: &'c ResourceChange) -> Result<&'c ResourceRecord> {
    change
        .record
        .as_ref()
        .ok_or_else(|| RegistryError::internal(format!("{}: resource vanished during update", key)))
}

fn written(change: &ResourceChange) -> Result<VersionsWritten> {
    let record = change
        .record
        .as_ref()
        .ok_or_else(|| RegistryError::internal("version write deleted its resource"))?;
    let versions = change
        .written
        .iter()
        .filter_map(|id| record.versions.get(id))
        .map(|version| VersionView {
            record: version.clone(),
            is_default: record.is_default(&version.id),
        })
        .collect();
    Ok(VersionsWritten {
        resource_created: change.cascade.creates_resource(),
        versions,
        pruned: change.pruned.clone(),
        default_version_id: record.meta.default_version_id.clone(),
    })
}

// ============================================================================
// Tests
// ============================================================================
