//! Per-resource version operations
//!
//! `ResourceEngine` runs one mutation of one resource against an owned copy
//! of its record:
//!
//! ```text
//! stage edges ─► unknown ancestors ─► cycles ─► order ─► single root
//!      ─► default version ─► retention ─► epoch cascade
//! ```
//!
//! Nothing here touches storage. The caller reads the record inside its
//! transaction, hands it over, and stages the returned record (plus the
//! group bump the cascade asks for). Any error leaves the caller's record
//! untouched, so aborting the transaction is all the rollback needed.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use xreg_core::{
    EntityPath, Epoch, MetaRecord, MetaUpdate, RegistryError, ResourceKey, ResourceModel,
    ResourceRecord, Result, Stamps, Timestamp, VersionId, VersionProposal, VersionRecord,
    WriteOptions,
};

use crate::ancestry::{
    compare_age, cycle_members, ordered_versions, AncestryGraph, DefaultVersionSelector,
    PruneReport, RetentionPruner, RootConstraint, VersionAncestor,
};
use crate::cascade::EpochCascade;

/// Result of one resource mutation
#[derive(Debug, Clone)]
pub struct ResourceChange {
    /// New record; `None` when the resource was deleted
    pub record: Option<ResourceRecord>,
    /// What must be bumped above the resource
    pub cascade: EpochCascade,
    /// IDs from the request that exist afterwards, in request order
    pub written: Vec<VersionId>,
    /// Versions removed by retention pruning
    pub pruned: Vec<VersionId>,
    /// Versions removed explicitly
    pub removed: Vec<VersionId>,
}

impl ResourceChange {
    fn unchanged(record: ResourceRecord, now: Timestamp) -> Self {
        Self {
            record: Some(record),
            cascade: EpochCascade::new(now),
            written: Vec::new(),
            pruned: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Whether the resource no longer exists
    pub fn is_deleted(&self) -> bool {
        self.record.is_none()
    }
}

/// The smallest free numeric ID greater than the current version count
pub fn next_version_id(record: Option<&ResourceRecord>) -> VersionId {
    let count = record.map_or(0, ResourceRecord::versions_count);
    let mut n = count as u64 + 1;
    loop {
        let candidate = VersionId::new_unchecked(n.to_string());
        if record.map_or(true, |r| !r.versions.contains_key(&candidate)) {
            return candidate;
        }
        n += 1;
    }
}

/// Runs version operations for one resource under one model
pub struct ResourceEngine<'a> {
    key: &'a ResourceKey,
    model: &'a ResourceModel,
    now: Timestamp,
}

impl<'a> ResourceEngine<'a> {
    /// Engine for `key`, stamping at the transaction time `now`
    pub fn new(key: &'a ResourceKey, model: &'a ResourceModel, now: Timestamp) -> Self {
        Self { key, model, now }
    }

    fn resource_path(&self) -> EntityPath {
        EntityPath::Resource(self.key.clone())
    }

    fn meta_path(&self) -> EntityPath {
        EntityPath::Meta(self.key.clone())
    }

    fn version_path(&self, id: &VersionId) -> EntityPath {
        EntityPath::version(self.key.clone(), id.clone())
    }

    fn check_sticky_allowed(&self) -> Result<()> {
        if self.model.set_default_version_sticky {
            Ok(())
        } else {
            Err(RegistryError::bad_request(
                self.meta_path(),
                "defaultversionsticky is not allowed for this resource type",
            ))
        }
    }

    fn rejected(&self, graph: &mut AncestryGraph, err: RegistryError) -> RegistryError {
        graph.discard_staged();
        debug!(target: "xreg::ancestry", resource = %self.key, error = %err, "Write rejected");
        err
    }

    // === Reads ===

    /// Ordered versions of a stored resource
    pub fn ordered(&self, record: &ResourceRecord) -> Result<Vec<VersionAncestor>> {
        ordered_versions(&AncestryGraph::from_record(record))
    }

    /// Number of root versions of a stored resource
    pub fn root_count(&self, record: &ResourceRecord) -> usize {
        AncestryGraph::from_record(record).roots().len()
    }

    // === Writes ===

    /// Create or update a batch of versions
    ///
    /// `existing` is `None` when the resource does not exist yet; it is then
    /// created by this write.
    pub fn write_versions(
        &self,
        existing: Option<ResourceRecord>,
        batch: Vec<(VersionId, VersionProposal)>,
        options: &WriteOptions,
    ) -> Result<ResourceChange> {
        if !self.model.set_version_id {
            let is_new = |id: &VersionId| {
                existing
                    .as_ref()
                    .map_or(true, |r| !r.versions.contains_key(id))
            };
            if let Some((id, _)) = batch.iter().find(|(id, _)| is_new(id)) {
                return Err(RegistryError::bad_request(
                    self.version_path(id),
                    "version IDs are assigned by the server for this resource type",
                ));
            }
        }
        self.write(existing, batch, options)
    }

    /// Create one version under a generated ID
    pub fn create_version(
        &self,
        existing: Option<ResourceRecord>,
        proposal: VersionProposal,
        options: &WriteOptions,
    ) -> Result<(VersionId, ResourceChange)> {
        let id = next_version_id(existing.as_ref());
        let change = self.write(existing, vec![(id.clone(), proposal)], options)?;
        Ok((id, change))
    }

    fn write(
        &self,
        existing: Option<ResourceRecord>,
        batch: Vec<(VersionId, VersionProposal)>,
        options: &WriteOptions,
    ) -> Result<ResourceChange> {
        let first_id = match batch.first() {
            Some((id, _)) => id.clone(),
            None => {
                return Err(RegistryError::bad_request(
                    self.resource_path(),
                    "no versions supplied",
                ))
            }
        };
        let mut seen = FxHashSet::default();
        for (id, _) in &batch {
            if !seen.insert(id) {
                return Err(RegistryError::bad_request(
                    self.version_path(id),
                    "version appears more than once in the request",
                ));
            }
        }

        let mut cascade = EpochCascade::new(self.now);
        let is_new = existing.is_none();
        let mut record = match existing {
            Some(record) => record,
            None => {
                cascade.resource_created();
                ResourceRecord {
                    key: self.key.clone(),
                    meta: MetaRecord {
                        default_version_id: first_id,
                        default_version_sticky: false,
                        stamps: Stamps::created(self.now),
                    },
                    versions: BTreeMap::new(),
                }
            }
        };

        let mut graph = AncestryGraph::from_record(&record);
        let tail = if is_new {
            None
        } else {
            ordered_versions(&graph)?.pop().map(|v| v.id)
        };

        // Stage every edge of the batch
        let mut unanchored: Vec<(VersionId, Timestamp)> = Vec::new();
        for (id, proposal) in &batch {
            match record.versions.get(id) {
                Some(current) => {
                    if let Some(expected) = proposal.epoch {
                        if expected != current.stamps.epoch {
                            let err = RegistryError::MismatchedEpoch {
                                subject: self.version_path(id),
                                expected,
                                actual: current.stamps.epoch,
                            };
                            return Err(self.rejected(&mut graph, err));
                        }
                    }
                    if let Some(created_at) = proposal.created_at {
                        if created_at != current.stamps.created_at {
                            let err = RegistryError::bad_request(
                                self.version_path(id),
                                "createdat cannot be changed once set",
                            );
                            return Err(self.rejected(&mut graph, err));
                        }
                    }
                    let ancestor = proposal
                        .ancestor
                        .clone()
                        .unwrap_or_else(|| current.ancestor.clone());
                    graph.stage_edge(id.clone(), ancestor, current.stamps.created_at);
                    cascade.touch_version(id.clone());
                }
                None => {
                    let created_at = proposal.created_at.unwrap_or(self.now);
                    match &proposal.ancestor {
                        Some(ancestor) => {
                            graph.stage_edge(id.clone(), ancestor.clone(), created_at)
                        }
                        None => unanchored.push((id.clone(), created_at)),
                    }
                    cascade.version_created(id.clone());
                }
            }
        }

        // New versions without an ancestor form one chain hanging off the
        // current last version; on a new resource the oldest becomes the root
        unanchored.sort_by(|a, b| compare_age(a.1, &a.0, b.1, &b.0));
        let mut previous = tail;
        for (id, created_at) in unanchored {
            let ancestor = previous.take().unwrap_or_else(|| id.clone());
            graph.stage_edge(id.clone(), ancestor, created_at);
            previous = Some(id);
        }

        if let Err(err) = graph.validate_ancestors() {
            return Err(self.rejected(&mut graph, err));
        }

        let pruner = RetentionPruner::new(self.model.max_versions);
        let mut report = PruneReport::default();
        let mut pruned_through_cycle = false;
        let cycle = cycle_members(&graph);
        if !cycle.is_empty() {
            if !pruner.exceeds(graph.len()) {
                let err = RegistryError::CircularAncestor {
                    subject: self.resource_path(),
                    ids: cycle,
                };
                return Err(self.rejected(&mut graph, err));
            }
            let protected = self.protected_by_age(&record, &graph, options, is_new)?;
            report = pruner.prune_by_age(&mut graph, &protected)?;
            let remaining = cycle_members(&graph);
            if !remaining.is_empty() {
                let err = RegistryError::CircularAncestor {
                    subject: self.resource_path(),
                    ids: remaining,
                };
                return Err(self.rejected(&mut graph, err));
            }
            pruned_through_cycle = true;
        }

        let mut order = match ordered_versions(&graph) {
            Ok(order) => order,
            Err(err) => return Err(self.rejected(&mut graph, err)),
        };
        if !pruned_through_cycle {
            if let Err(err) =
                RootConstraint::new(self.model.single_version_root).check(self.key, &order)
            {
                return Err(self.rejected(&mut graph, err));
            }
        }

        // Default version
        let before = (
            record.meta.default_version_id.clone(),
            record.meta.default_version_sticky,
        );
        if let Some(pin) = &options.set_default_version_id {
            if let Err(err) = self.check_sticky_allowed() {
                return Err(self.rejected(&mut graph, err));
            }
            if !graph.contains(pin) {
                let err = RegistryError::UnknownId {
                    subject: self.resource_path(),
                    id: pin.clone(),
                };
                return Err(self.rejected(&mut graph, err));
            }
            DefaultVersionSelector::pin(&mut record.meta, pin.clone());
        } else {
            DefaultVersionSelector::refresh(&mut record.meta, &order);
        }
        graph.commit_staged();

        // Retention
        if pruner.exceeds(graph.len()) {
            let protected = record.meta.default_version_id.clone();
            let more = pruner.prune(&mut graph, &protected)?;
            graph.commit_staged();
            for id in more.pruned {
                report.repaired.retain(|r| r != &id);
                report.pruned.push(id);
            }
            for id in more.repaired {
                if !report.repaired.contains(&id) {
                    report.repaired.push(id);
                }
            }
            order = ordered_versions(&graph)?;
            DefaultVersionSelector::refresh(&mut record.meta, &order);
        }

        if (
            &record.meta.default_version_id,
            record.meta.default_version_sticky,
        ) != (&before.0, before.1)
        {
            cascade.touch_meta();
        }
        for id in &report.pruned {
            cascade.version_removed(id);
        }
        for id in &report.repaired {
            cascade.touch_version(id.clone());
        }

        // Write back
        let proposals: FxHashMap<&VersionId, &VersionProposal> =
            batch.iter().map(|(id, p)| (id, p)).collect();
        let mut versions = BTreeMap::new();
        for node in graph.nodes() {
            let version = match record.versions.remove(&node.id) {
                Some(mut version) => {
                    version.ancestor = node.ancestor.clone();
                    // An empty set keeps what is stored, like an absent ancestor.
                    if let Some(proposal) = proposals.get(&node.id) {
                        if !proposal.attributes.is_empty() {
                            version.attributes = proposal.attributes.clone();
                        }
                    }
                    version
                }
                None => VersionRecord {
                    id: node.id.clone(),
                    ancestor: node.ancestor.clone(),
                    stamps: Stamps {
                        epoch: Epoch::INITIAL,
                        created_at: node.created_at,
                        modified_at: self.now,
                    },
                    attributes: proposals
                        .get(&node.id)
                        .map(|p| p.attributes.clone())
                        .unwrap_or_default(),
                },
            };
            versions.insert(node.id.clone(), version);
        }
        record.versions = versions;
        cascade.apply(&mut record);

        let written: Vec<VersionId> = batch
            .iter()
            .filter(|(id, _)| record.versions.contains_key(id))
            .map(|(id, _)| id.clone())
            .collect();
        debug!(
            target: "xreg::ancestry",
            resource = %self.key,
            created = is_new,
            written = written.len(),
            pruned = ?report.pruned,
            default = %record.meta.default_version_id,
            "Versions written"
        );

        Ok(ResourceChange {
            record: Some(record),
            cascade,
            written,
            pruned: report.pruned,
            removed: Vec::new(),
        })
    }

    /// Version kept by age-order pruning when the staged graph is cyclic
    fn protected_by_age(
        &self,
        record: &ResourceRecord,
        graph: &AncestryGraph,
        options: &WriteOptions,
        is_new: bool,
    ) -> Result<VersionId> {
        if let Some(pin) = options
            .set_default_version_id
            .as_ref()
            .filter(|pin| graph.contains(pin))
        {
            return Ok(pin.clone());
        }
        if !is_new
            && record.meta.default_version_sticky
            && graph.contains(&record.meta.default_version_id)
        {
            return Ok(record.meta.default_version_id.clone());
        }
        RetentionPruner::newest(graph)
            .ok_or_else(|| RegistryError::internal("pruning an empty version graph"))
    }

    /// Delete versions, optionally pinning a replacement default
    ///
    /// Deleting every version deletes the resource.
    pub fn delete_versions(
        &self,
        mut record: ResourceRecord,
        ids: &[VersionId],
        new_default: Option<&VersionId>,
    ) -> Result<ResourceChange> {
        if ids.is_empty() {
            return Err(RegistryError::bad_request(
                self.resource_path(),
                "no versions to delete",
            ));
        }
        let mut doomed = ids.to_vec();
        doomed.sort();
        doomed.dedup();
        if let Some(missing) = doomed.iter().find(|id| !record.versions.contains_key(*id)) {
            return Err(RegistryError::not_found(self.version_path(missing)));
        }
        if let Some(replacement) = new_default {
            if doomed.contains(replacement) {
                return Err(RegistryError::bad_request(
                    self.meta_path(),
                    "can't set defaultversionid to a Version that is being deleted",
                ));
            }
            if !record.versions.contains_key(replacement) {
                return Err(RegistryError::UnknownId {
                    subject: self.resource_path(),
                    id: replacement.clone(),
                });
            }
            self.check_sticky_allowed()?;
        }

        let mut cascade = EpochCascade::new(self.now);
        if doomed.len() == record.versions.len() {
            cascade.resource_deleted();
            debug!(target: "xreg::ancestry", resource = %self.key, "Last version deleted, removing resource");
            return Ok(ResourceChange {
                record: None,
                cascade,
                written: Vec::new(),
                pruned: Vec::new(),
                removed: doomed,
            });
        }

        let mut graph = AncestryGraph::from_record(&record);
        let mut repaired: Vec<VersionId> = Vec::new();
        for id in &doomed {
            if let Some((_, children)) = graph.remove_node(id) {
                repaired.extend(children);
            }
            cascade.version_removed(id);
        }
        repaired.retain(|r| graph.contains(r));

        let order = match ordered_versions(&graph) {
            Ok(order) => order,
            Err(err) => return Err(self.rejected(&mut graph, err)),
        };
        if let Err(err) = RootConstraint::new(self.model.single_version_root).check(self.key, &order)
        {
            return Err(self.rejected(&mut graph, err));
        }
        graph.commit_staged();

        for id in repaired {
            cascade.touch_version(id);
        }
        if let Some(replacement) = new_default {
            DefaultVersionSelector::pin(&mut record.meta, replacement.clone());
        } else if record.meta.default_version_sticky
            && doomed.contains(&record.meta.default_version_id)
        {
            DefaultVersionSelector::unpin(&mut record.meta, &order);
        } else {
            DefaultVersionSelector::refresh(&mut record.meta, &order);
        }

        sync_versions(&mut record, &graph);
        cascade.apply(&mut record);
        debug!(
            target: "xreg::ancestry",
            resource = %self.key,
            removed = ?doomed,
            default = %record.meta.default_version_id,
            "Versions deleted"
        );

        Ok(ResourceChange {
            record: Some(record),
            cascade,
            written: Vec::new(),
            pruned: Vec::new(),
            removed: doomed,
        })
    }

    /// Apply an explicit Meta update
    pub fn update_meta(&self, mut record: ResourceRecord, update: &MetaUpdate) -> Result<ResourceChange> {
        if let Some(expected) = update.epoch {
            if expected != record.meta.stamps.epoch {
                return Err(RegistryError::MismatchedEpoch {
                    subject: self.meta_path(),
                    expected,
                    actual: record.meta.stamps.epoch,
                });
            }
        }

        match (update.default_version_sticky, &update.default_version_id) {
            (Some(false), Some(_)) => {
                return Err(RegistryError::bad_request(
                    self.meta_path(),
                    "defaultversionid can't be set while defaultversionsticky is false",
                ));
            }
            (_, Some(id)) => {
                self.check_sticky_allowed()?;
                if !record.versions.contains_key(id) {
                    return Err(RegistryError::UnknownId {
                        subject: self.resource_path(),
                        id: id.clone(),
                    });
                }
                DefaultVersionSelector::pin(&mut record.meta, id.clone());
            }
            (Some(true), None) => {
                self.check_sticky_allowed()?;
                DefaultVersionSelector::pin_current(&mut record.meta);
            }
            (Some(false), None) => {
                let order = self.ordered(&record)?;
                DefaultVersionSelector::unpin(&mut record.meta, &order);
            }
            (None, None) => {}
        }

        let mut cascade = EpochCascade::new(self.now);
        cascade.touch_meta();
        cascade.apply(&mut record);
        debug!(
            target: "xreg::ancestry",
            resource = %self.key,
            sticky = record.meta.default_version_sticky,
            default = %record.meta.default_version_id,
            "Meta updated"
        );
        Ok(ResourceChange {
            record: Some(record),
            cascade,
            written: Vec::new(),
            pruned: Vec::new(),
            removed: Vec::new(),
        })
    }

    /// Switch stickiness, optionally naming the version to pin
    pub fn set_default_version_sticky(
        &self,
        record: ResourceRecord,
        sticky: bool,
        id: Option<VersionId>,
    ) -> Result<ResourceChange> {
        let update = MetaUpdate {
            default_version_sticky: Some(sticky),
            default_version_id: id,
            epoch: None,
        };
        self.update_meta(record, &update)
    }

    /// Prune a stored resource down to the model's cap
    ///
    /// Used after the cap of an existing resource type is lowered.
    pub fn enforce_retention(&self, mut record: ResourceRecord) -> Result<ResourceChange> {
        let pruner = RetentionPruner::new(self.model.max_versions);
        if !pruner.exceeds(record.versions_count()) {
            return Ok(ResourceChange::unchanged(record, self.now));
        }

        let mut graph = AncestryGraph::from_record(&record);
        let protected = record.meta.default_version_id.clone();
        let report = pruner.prune(&mut graph, &protected)?;
        graph.commit_staged();
        let order = ordered_versions(&graph)?;

        let mut cascade = EpochCascade::new(self.now);
        for id in &report.pruned {
            cascade.version_removed(id);
        }
        for id in &report.repaired {
            cascade.touch_version(id.clone());
        }
        DefaultVersionSelector::refresh(&mut record.meta, &order);

        sync_versions(&mut record, &graph);
        cascade.apply(&mut record);
        Ok(ResourceChange {
            record: Some(record),
            cascade,
            written: Vec::new(),
            pruned: report.pruned,
            removed: Vec::new(),
        })
    }
}

/// Drop versions missing from `graph` and copy its ancestors back
fn sync_versions(record: &mut ResourceRecord, graph: &AncestryGraph) {
    record.versions.retain(|id, _| graph.contains(id));
    for version in record.versions.values_mut() {
        if let Some(node) = graph.get(&version.id) {
            if version.ancestor != node.ancestor {
                version.ancestor = node.ancestor.clone();
            }
        }
    }
}
