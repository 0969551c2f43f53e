//! Registry configuration via `xregistry.toml`
//!
//! On first open a default `xregistry.toml` is written into the data
//! directory. It carries the registry id, the snapshot switch and the model
//! (group types, resource types and their version policies). Model updates
//! made through the API are written back to the same file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use xreg_core::{GroupModel, RegistryError, RegistryModel, Result};

/// Config file name placed in the registry data directory.
pub const CONFIG_FILE_NAME: &str = "xregistry.toml";

/// Registry configuration loaded from `xregistry.toml`.
///
/// # Example
///
/// ```toml
/// registry_id = "my-registry"
/// snapshot = true
///
/// [groups.dirs]
/// singular = "dir"
///
/// [groups.dirs.resources.files]
/// singular = "file"
/// max_versions = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// `registryid` of the Registry entity; generated on first open when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<String>,
    /// Persist a JSON snapshot on flush and close.
    #[serde(default = "default_snapshot")]
    pub snapshot: bool,
    /// Group types keyed by plural name.
    #[serde(default)]
    pub groups: BTreeMap<String, GroupModel>,
}

fn default_snapshot() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_id: None,
            snapshot: default_snapshot(),
            groups: RegistryModel::default_model().groups,
        }
    }
}

impl RegistryConfig {
    /// Config with the given model and every other setting at its default.
    pub fn with_model(model: RegistryModel) -> Self {
        Self {
            groups: model.groups,
            ..Self::default()
        }
    }

    /// The model described by this config.
    pub fn model(&self) -> RegistryModel {
        RegistryModel {
            groups: self.groups.clone(),
        }
    }

    /// Replace the model, keeping every other setting.
    pub fn set_model(&mut self, model: RegistryModel) {
        self.groups = model.groups;
    }

    /// Check the model part of the config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the offending type.
    pub fn validate(&self) -> Result<()> {
        self.model()
            .validate()
            .map_err(|reason| RegistryError::invalid_input(format!("invalid model: {}", reason)))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# xRegistry configuration
#
# registryid reported by the Registry entity. Generated on first open
# when absent.
# registry_id = "my-registry"

# Persist a JSON snapshot of the registry on flush and close (default: true)
snapshot = true

# Model: group types keyed by plural name, each with its resource types.
[groups.dirs]
singular = "dir"

[groups.dirs.resources.files]
singular = "file"
# max_versions = 0                    # retention cap, 0 = unlimited
# set_version_id = true               # clients may choose version IDs
# set_default_version_sticky = true   # clients may pin the default version
# single_version_root = false         # at most one root version
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the model
    /// is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::storage(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: RegistryConfig = toml::from_str(&content).map_err(|e| {
            RegistryError::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                RegistryError::storage(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RegistryError::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            RegistryError::storage(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use xreg_core::ResourceModel;

    #[test]
    fn default_config_has_default_model() {
        let config = RegistryConfig::default();
        assert!(config.snapshot);
        assert!(config.registry_id.is_none());
        assert_eq!(config.model(), RegistryModel::default_model());
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config: RegistryConfig = toml::from_str(RegistryConfig::default_toml()).unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn parse_resource_policies() {
        let config: RegistryConfig = toml::from_str(
            r#"
registry_id = "reg"
snapshot = false

[groups.schemagroups]
singular = "schemagroup"

[groups.schemagroups.resources.schemas]
singular = "schema"
max_versions = 3
set_version_id = false
single_version_root = true
"#,
        )
        .unwrap();
        assert_eq!(config.registry_id.as_deref(), Some("reg"));
        assert!(!config.snapshot);
        let schemas = config.model().resource("schemagroups", "schemas").cloned().unwrap();
        assert_eq!(schemas.max_versions, 3);
        assert!(!schemas.set_version_id);
        assert!(schemas.set_default_version_sticky);
        assert!(schemas.single_version_root);
    }

    #[test]
    fn invalid_model_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[groups.dirs]\nsingular = \"dirs\"\n").unwrap();
        let err = RegistryConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput { .. }));
    }

    #[test]
    fn unparsable_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "snapshot = \"maybe\"").unwrap();
        assert!(RegistryConfig::from_file(&path).is_err());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        RegistryConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(config.model(), RegistryModel::default_model());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "snapshot = false\n").unwrap();

        RegistryConfig::write_default_if_missing(&path).unwrap();
        let config = RegistryConfig::from_file(&path).unwrap();
        assert!(!config.snapshot);
        assert!(config.groups.is_empty());
    }

    #[test]
    fn write_to_file_round_trips_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = RegistryConfig::default();
        config.registry_id = Some("reg-1".to_string());
        config.set_model(RegistryModel::new().with_group(
            "dirs",
            GroupModel::new("dir")
                .with_resource("files", ResourceModel::new("file").with_max_versions(5)),
        ));

        config.write_to_file(&path).unwrap();
        let loaded = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
