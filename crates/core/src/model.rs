//! Registry model types
//!
//! The model names the group types and, per group type, the resource types a
//! registry serves. Only the resource-level flags the version engine reacts
//! to are modelled here; attribute schemas belong to the validator.
//!
//! ```toml
//! [groups.dirs]
//! singular = "dir"
//!
//! [groups.dirs.resources.files]
//! singular = "file"
//! max_versions = 10
//! single_version_root = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level model: group types keyed by plural name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryModel {
    /// Group types
    #[serde(default)]
    pub groups: BTreeMap<String, GroupModel>,
}

/// A group type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupModel {
    /// Singular name (e.g. `dir`)
    pub singular: String,
    /// Resource types keyed by plural name
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceModel>,
}

/// A resource type and its version policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceModel {
    /// Singular name (e.g. `file`)
    pub singular: String,
    /// Retention cap; 0 means unlimited
    #[serde(default)]
    pub max_versions: usize,
    /// Clients may choose version IDs
    #[serde(default = "default_true")]
    pub set_version_id: bool,
    /// Clients may pin the default version
    #[serde(default = "default_true")]
    pub set_default_version_sticky: bool,
    /// At most one root version per resource
    #[serde(default)]
    pub single_version_root: bool,
}

fn default_true() -> bool {
    true
}

impl ResourceModel {
    /// A resource type with every policy at its default
    pub fn new(singular: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            max_versions: 0,
            set_version_id: true,
            set_default_version_sticky: true,
            single_version_root: false,
        }
    }

    /// Set the retention cap
    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions;
        self
    }

    /// Enable or disable the single-root policy
    pub fn with_single_version_root(mut self, enabled: bool) -> Self {
        self.single_version_root = enabled;
        self
    }

    /// Allow or forbid client-chosen version IDs
    pub fn with_set_version_id(mut self, allowed: bool) -> Self {
        self.set_version_id = allowed;
        self
    }

    /// Allow or forbid sticky defaults
    pub fn with_set_default_version_sticky(mut self, allowed: bool) -> Self {
        self.set_default_version_sticky = allowed;
        self
    }
}

impl GroupModel {
    /// A group type without resource types
    pub fn new(singular: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            resources: BTreeMap::new(),
        }
    }

    /// Add a resource type
    pub fn with_resource(mut self, plural: impl Into<String>, model: ResourceModel) -> Self {
        self.resources.insert(plural.into(), model);
        self
    }
}

impl RegistryModel {
    /// Empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group type
    pub fn with_group(mut self, plural: impl Into<String>, model: GroupModel) -> Self {
        self.groups.insert(plural.into(), model);
        self
    }

    /// The model used when none is configured: `dirs` holding `files`
    pub fn default_model() -> Self {
        Self::new().with_group(
            "dirs",
            GroupModel::new("dir").with_resource("files", ResourceModel::new("file")),
        )
    }

    /// Look up a group type
    pub fn group(&self, group_type: &str) -> Option<&GroupModel> {
        self.groups.get(group_type)
    }

    /// Look up a resource type within a group type
    pub fn resource(&self, group_type: &str, resource_type: &str) -> Option<&ResourceModel> {
        self.group(group_type)?.resources.get(resource_type)
    }

    /// Check names and singular/plural uniqueness
    ///
    /// Returns a human readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        for (plural, group) in &self.groups {
            check_name(plural)?;
            check_name(&group.singular)?;
            if plural == &group.singular {
                return Err(format!(
                    "group type '{}' has identical singular and plural names",
                    plural
                ));
            }
            for (rplural, resource) in &group.resources {
                check_name(rplural)?;
                check_name(&resource.singular)?;
                if rplural == &resource.singular {
                    return Err(format!(
                        "resource type '{}/{}' has identical singular and plural names",
                        plural, rplural
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_lowercase() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(format!(
            "invalid model name '{}' (lowercase letters, digits and '_' only)",
            name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let model = RegistryModel::default_model();
        let files = model.resource("dirs", "files").unwrap();
        assert_eq!(files.singular, "file");
        assert_eq!(files.max_versions, 0);
        assert!(files.set_version_id);
        assert!(files.set_default_version_sticky);
        assert!(!files.single_version_root);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_lookup_unknown_types() {
        let model = RegistryModel::default_model();
        assert!(model.resource("dirs", "schemas").is_none());
        assert!(model.resource("endpoints", "files").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let model = RegistryModel::new().with_group("Dirs", GroupModel::new("dir"));
        assert!(model.validate().is_err());

        let model = RegistryModel::new().with_group("dirs", GroupModel::new("dirs"));
        assert!(model.validate().unwrap_err().contains("identical"));
    }

    #[test]
    fn test_serde_defaults() {
        let json = r#"{"groups":{"dirs":{"singular":"dir","resources":{"files":{"singular":"file"}}}}}"#;
        let model: RegistryModel = serde_json::from_str(json).unwrap();
        assert_eq!(model, RegistryModel::default_model());
    }
}
