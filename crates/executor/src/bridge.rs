//! Bridge module: command fields to engine types.
//!
//! Commands carry raw strings. This module validates them into the typed
//! keys and IDs the engine expects:
//!
//! - [`group_key`]: group type + group ID
//! - [`resource_key`]: the four path segments of a resource
//! - [`version_id`] / [`version_ids`]: version IDs

use xreg_core::{GroupId, GroupKey, ResourceId, ResourceKey, VersionId};

use crate::convert::invalid_id;
use crate::Result;

/// Validate a group address
pub fn group_key(group_type: &str, group_id: &str) -> Result<GroupKey> {
    let id = GroupId::new(group_id).map_err(|e| invalid_id(group_id, e))?;
    Ok(GroupKey::new(group_type, id))
}

/// Validate a resource address
pub fn resource_key(
    group_type: &str,
    group_id: &str,
    resource_type: &str,
    resource_id: &str,
) -> Result<ResourceKey> {
    let group = group_key(group_type, group_id)?;
    let id = ResourceId::new(resource_id).map_err(|e| invalid_id(resource_id, e))?;
    Ok(group.resource(resource_type, id))
}

/// Validate one version ID
pub fn version_id(id: &str) -> Result<VersionId> {
    VersionId::new(id).map_err(|e| invalid_id(id, e))
}

/// Validate a list of version IDs, keeping their order
pub fn version_ids<S: AsRef<str>>(ids: &[S]) -> Result<Vec<VersionId>> {
    ids.iter().map(|id| version_id(id.as_ref())).collect()
}

/// Validate an optional version ID
pub fn maybe_version_id(id: Option<&str>) -> Result<Option<VersionId>> {
    id.map(version_id).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_resource_key_renders_path() {
        let key = resource_key("dirs", "d1", "files", "f1").unwrap();
        assert_eq!(key.to_string(), "/dirs/d1/files/f1");
    }

    #[test]
    fn test_bad_ids_rejected() {
        assert!(matches!(
            resource_key("dirs", "d 1", "files", "f1"),
            Err(Error::InvalidId { ref value, .. }) if value == "d 1"
        ));
        assert!(matches!(
            resource_key("dirs", "d1", "files", ""),
            Err(Error::InvalidId { .. })
        ));
        assert!(matches!(version_id("-v1"), Err(Error::InvalidId { .. })));
    }

    #[test]
    fn test_version_ids_keep_order() {
        let ids = version_ids(&["b", "a"]).unwrap();
        assert_eq!(ids, vec![VersionId::new_unchecked("b"), VersionId::new_unchecked("a")]);
        assert_eq!(maybe_version_id(None).unwrap(), None);
    }
}
