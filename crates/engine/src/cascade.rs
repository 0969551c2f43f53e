//! Epoch cascade
//!
//! Collects, over one operation, which entities changed observably and
//! bumps each of them exactly once at the transaction time:
//!
//! ```text
//! Version ──► Meta ──► Group ──► Registry
//! ```
//!
//! Meta is bumped when versions were added or removed or the default pointer
//! or mode moved. Adding or removing a version or a resource also bumps the
//! owning Group and the Registry. A default change alone stops at Meta.
//! Freshly created entities start at the initial epoch and are never bumped
//! in the operation that created them.

use rustc_hash::FxHashSet;

use xreg_core::{ResourceRecord, Timestamp, VersionId};

/// Touch set of one operation
#[derive(Debug, Clone)]
pub struct EpochCascade {
    now: Timestamp,
    created_versions: FxHashSet<VersionId>,
    touched_versions: FxHashSet<VersionId>,
    resource_created: bool,
    meta: bool,
    group: bool,
    registry: bool,
}

impl EpochCascade {
    /// Empty touch set stamping at `now`
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            created_versions: FxHashSet::default(),
            touched_versions: FxHashSet::default(),
            resource_created: false,
            meta: false,
            group: false,
            registry: false,
        }
    }

    /// Transaction time used for every stamp
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// The resource did not exist before this operation
    ///
    /// Its Meta is new and the owning group gains a resource.
    pub fn resource_created(&mut self) {
        self.resource_created = true;
        self.touch_containers();
    }

    /// The resource is gone after this operation
    pub fn resource_deleted(&mut self) {
        self.touch_containers();
    }

    /// A version was created by this operation
    pub fn version_created(&mut self, id: VersionId) {
        self.touched_versions.remove(&id);
        self.created_versions.insert(id);
        self.meta = true;
        self.touch_containers();
    }

    /// A version was deleted by this operation
    pub fn version_removed(&mut self, id: &VersionId) {
        self.touched_versions.remove(id);
        self.created_versions.remove(id);
        self.meta = true;
        self.touch_containers();
    }

    fn touch_containers(&mut self) {
        self.group = true;
        self.registry = true;
    }

    /// An existing version changed
    pub fn touch_version(&mut self, id: VersionId) {
        if !self.created_versions.contains(&id) {
            self.touched_versions.insert(id);
        }
    }

    /// Meta changed observably
    pub fn touch_meta(&mut self) {
        self.meta = true;
    }

    /// Whether this operation created the resource
    pub fn creates_resource(&self) -> bool {
        self.resource_created
    }

    /// Whether `id` was created in this operation
    pub fn is_created(&self, id: &VersionId) -> bool {
        self.created_versions.contains(id)
    }

    /// Whether the version will be bumped
    pub fn is_version_touched(&self, id: &VersionId) -> bool {
        self.touched_versions.contains(id)
    }

    /// Whether Meta will be bumped
    pub fn meta_touched(&self) -> bool {
        self.meta && !self.resource_created
    }

    /// Whether the owning group must be bumped
    pub fn group_touched(&self) -> bool {
        self.group
    }

    /// Whether the registry must be bumped
    pub fn registry_touched(&self) -> bool {
        self.registry
    }

    /// Bump every touched version and, when touched, Meta
    ///
    /// Group and Registry bumps are staged by the caller in its transaction.
    pub fn apply(&self, record: &mut ResourceRecord) {
        for id in &self.touched_versions {
            if let Some(version) = record.versions.get_mut(id) {
                version.stamps.bump(self.now);
            }
        }
        if self.meta_touched() {
            record.meta.stamps.bump(self.now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use xreg_core::{Attributes, Epoch, MetaRecord, ResourceKey, Stamps, VersionRecord};

    fn id(s: &str) -> VersionId {
        VersionId::new_unchecked(s)
    }

    fn record() -> ResourceRecord {
        let mut versions = BTreeMap::new();
        for (v, a) in [("v1", "v1"), ("v2", "v1")] {
            versions.insert(
                id(v),
                VersionRecord {
                    id: id(v),
                    ancestor: id(a),
                    stamps: Stamps::created(Timestamp::from_secs(1)),
                    attributes: Attributes::new(),
                },
            );
        }
        ResourceRecord {
            key: ResourceKey::parse("dirs", "d1", "files", "f1").unwrap(),
            meta: MetaRecord {
                default_version_id: id("v2"),
                default_version_sticky: false,
                stamps: Stamps::created(Timestamp::from_secs(1)),
            },
            versions,
        }
    }

    #[test]
    fn test_version_only_change_leaves_meta() {
        let mut r = record();
        let mut cascade = EpochCascade::new(Timestamp::from_secs(10));
        cascade.touch_version(id("v1"));
        cascade.touch_version(id("v1"));
        cascade.apply(&mut r);

        assert_eq!(r.versions[&id("v1")].stamps.epoch, Epoch::new(2));
        assert_eq!(
            r.versions[&id("v1")].stamps.modified_at,
            Timestamp::from_secs(10)
        );
        assert_eq!(r.versions[&id("v2")].stamps.epoch, Epoch::INITIAL);
        assert_eq!(r.meta.stamps.epoch, Epoch::INITIAL);
        assert!(!cascade.group_touched());
    }

    #[test]
    fn test_created_version_is_not_bumped() {
        let mut cascade = EpochCascade::new(Timestamp::from_secs(10));
        cascade.version_created(id("v3"));
        cascade.touch_version(id("v3"));
        assert!(cascade.is_created(&id("v3")));
        assert!(!cascade.is_version_touched(&id("v3")));
        assert!(cascade.meta_touched());
    }

    #[test]
    fn test_new_resource_meta_is_not_bumped() {
        let mut cascade = EpochCascade::new(Timestamp::from_secs(10));
        cascade.resource_created();
        cascade.version_created(id("v1"));
        assert!(!cascade.meta_touched());
        assert!(cascade.group_touched());
        assert!(cascade.registry_touched());
    }

    #[test]
    fn test_version_count_change_reaches_registry() {
        let mut cascade = EpochCascade::new(Timestamp::from_secs(10));
        cascade.version_created(id("v3"));
        assert!(cascade.group_touched());
        assert!(cascade.registry_touched());

        let mut cascade = EpochCascade::new(Timestamp::from_secs(10));
        cascade.version_removed(&id("v1"));
        assert!(cascade.meta_touched());
        assert!(cascade.group_touched());
        assert!(cascade.registry_touched());
    }

    #[test]
    fn test_default_move_stops_at_meta() {
        let mut cascade = EpochCascade::new(Timestamp::from_secs(10));
        cascade.touch_version(id("v1"));
        cascade.touch_meta();
        assert!(cascade.meta_touched());
        assert!(!cascade.group_touched());
        assert!(!cascade.registry_touched());
    }
}
