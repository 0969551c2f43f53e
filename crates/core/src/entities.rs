//! Stored entity records and read views
//!
//! Records are what the storage layer keeps. Views are what reads return:
//! they add the derived attributes (`isdefault`, `versionscount`, the
//! `<plural>count` aggregates) that are never stored authoritatively.

use crate::contract::{Epoch, Timestamp};
use crate::types::{GroupKey, ResourceKey, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque, already-validated extension attributes (name, description, labels, ...)
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Creation/modification bookkeeping common to every entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamps {
    /// Optimistic-concurrency counter
    pub epoch: Epoch,
    /// Set once at creation
    pub created_at: Timestamp,
    /// Set on every bump
    pub modified_at: Timestamp,
}

impl Stamps {
    /// Stamps for an entity created at `at`
    pub fn created(at: Timestamp) -> Self {
        Self {
            epoch: Epoch::INITIAL,
            created_at: at,
            modified_at: at,
        }
    }

    /// Advance the epoch and move `modified_at` forward to `at`
    ///
    /// `modified_at` never moves backwards.
    pub fn bump(&mut self, at: Timestamp) {
        self.epoch.bump();
        if at > self.modified_at {
            self.modified_at = at;
        }
    }
}

/// One Version of a Resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Immutable ID
    pub id: VersionId,
    /// Logical predecessor; equal to `id` for a root
    pub ancestor: VersionId,
    /// Epoch and timestamps
    pub stamps: Stamps,
    /// Extension attributes
    #[serde(default)]
    pub attributes: Attributes,
}

impl VersionRecord {
    /// A version is a root when it is its own ancestor
    #[inline]
    pub fn is_root(&self) -> bool {
        self.ancestor == self.id
    }
}

/// Resource-level bookkeeping (the `meta` sub-entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    /// Version returned when the resource is addressed without a version
    pub default_version_id: VersionId,
    /// When true the default is pinned and never re-pointed automatically
    pub default_version_sticky: bool,
    /// Epoch and timestamps
    pub stamps: Stamps,
}

/// A Resource: its Meta plus every Version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Address
    pub key: ResourceKey,
    /// Meta sub-entity
    pub meta: MetaRecord,
    /// Versions keyed by ID
    pub versions: BTreeMap<VersionId, VersionRecord>,
}

impl ResourceRecord {
    /// Number of versions
    pub fn versions_count(&self) -> usize {
        self.versions.len()
    }

    /// The current default version record
    pub fn default_version(&self) -> Option<&VersionRecord> {
        self.versions.get(&self.meta.default_version_id)
    }

    /// Whether `id` is the current default
    pub fn is_default(&self, id: &VersionId) -> bool {
        &self.meta.default_version_id == id
    }
}

/// A Group record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Address
    pub key: GroupKey,
    /// Epoch and timestamps
    pub stamps: Stamps,
    /// Extension attributes
    #[serde(default)]
    pub attributes: Attributes,
}

/// The Registry record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// `registryid`
    pub id: String,
    /// Epoch and timestamps
    pub stamps: Stamps,
}

/// Read view of a Version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionView {
    /// Stored record
    #[serde(flatten)]
    pub record: VersionRecord,
    /// Derived: whether this is the resource's default version
    pub is_default: bool,
}

/// Read view of a Meta sub-entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaView {
    /// Stored record
    #[serde(flatten)]
    pub record: MetaRecord,
    /// Derived: number of versions
    pub versions_count: usize,
}

/// Read view of a Resource: the default version plus aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    /// Address
    pub key: ResourceKey,
    /// Default version
    pub default_version: VersionView,
    /// Derived: number of versions
    pub versions_count: usize,
    /// Meta sub-entity
    pub meta: MetaRecord,
}

impl ResourceView {
    /// Build the view from a stored record
    ///
    /// Returns `None` if the record's default pointer is dangling.
    pub fn from_record(record: &ResourceRecord) -> Option<Self> {
        let default = record.default_version()?;
        Some(Self {
            key: record.key.clone(),
            default_version: VersionView {
                record: default.clone(),
                is_default: true,
            },
            versions_count: record.versions_count(),
            meta: record.meta.clone(),
        })
    }
}

/// Read view of a Group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupView {
    /// Stored record
    #[serde(flatten)]
    pub record: GroupRecord,
    /// Derived: resource count per resource type
    pub resource_counts: BTreeMap<String, usize>,
}

/// Read view of the Registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryView {
    /// Stored record
    #[serde(flatten)]
    pub record: RegistryRecord,
    /// Derived: group count per group type
    pub group_counts: BTreeMap<String, usize>,
}
