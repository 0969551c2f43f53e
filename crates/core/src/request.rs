//! Mutation request types
//!
//! These are the already-validated inputs the version engine consumes. The
//! attribute validator has checked types and ID patterns; what remains is
//! ancestry, default-version and epoch semantics.

use crate::contract::{Epoch, Timestamp};
use crate::entities::Attributes;
use crate::types::VersionId;
use serde::{Deserialize, Serialize};

/// Proposed fields for one version in a create-or-update request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionProposal {
    /// Explicit ancestor; `None` keeps an existing version's ancestor or
    /// lets a new version be chained automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<VersionId>,
    /// Creation time for a new version; must match on updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Optimistic-concurrency check for an existing version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<Epoch>,
    /// Replacement extension attributes; empty keeps an existing version's
    /// attributes
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl VersionProposal {
    /// Empty proposal
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ancestor
    pub fn with_ancestor(mut self, ancestor: VersionId) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Set the creation time
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Require the stored epoch to match
    pub fn with_epoch(mut self, epoch: Epoch) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Set one extension attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Request-level options of a version write (`?setdefaultversionid=`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Pin the default to this version once the write is applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_default_version_id: Option<VersionId>,
}

impl WriteOptions {
    /// Pin the default to `id`
    pub fn pin_default(id: VersionId) -> Self {
        Self {
            set_default_version_id: Some(id),
        }
    }
}

/// Update of a Resource's Meta sub-entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaUpdate {
    /// New stickiness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version_sticky: Option<bool>,
    /// New pinned default (implies sticky)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version_id: Option<VersionId>,
    /// Optimistic-concurrency check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<Epoch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_builder() {
        let p = VersionProposal::new()
            .with_ancestor(VersionId::new_unchecked("v1"))
            .with_epoch(Epoch::new(2))
            .with_attribute("name", serde_json::json!("first"));
        assert_eq!(p.ancestor.as_ref().map(VersionId::as_str), Some("v1"));
        assert_eq!(p.epoch, Some(Epoch::new(2)));
        assert_eq!(p.attributes["name"], serde_json::json!("first"));
        assert!(p.created_at.is_none());
    }

    #[test]
    fn test_proposal_rejects_unknown_fields() {
        let err = serde_json::from_str::<VersionProposal>(r#"{"ancestr":"v1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_proposal_rejects_empty_ancestor() {
        let err = serde_json::from_str::<VersionProposal>(r#"{"ancestor":""}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_meta_update_defaults() {
        let update: MetaUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(update, MetaUpdate::default());
    }
}
