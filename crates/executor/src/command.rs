//! Command enum defining all registry operations.
//!
//! Commands are the "instruction set" of the registry. Every operation that
//! a client (the HTTP layer, an SDK, a test) can perform is represented as a
//! variant of this enum.
//!
//! Commands are:
//! - **Self-contained**: All parameters needed for execution are in the variant
//! - **Serializable**: Can be converted to/from JSON for cross-language use
//! - **Pure data**: No closures or executable code
//!
//! Entity addresses are carried as raw path segments and validated by the
//! executor, so a malformed ID surfaces as `Error::InvalidId`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xreg_core::{Attributes, MetaUpdate, RegistryModel, VersionProposal};

/// A command is a self-contained, serializable operation.
///
/// # Command Categories
///
/// | Category | Count | Description |
/// |----------|-------|-------------|
/// | Registry | 5 | Ping, registry entity, model, flush |
/// | Group | 4 | Group lifecycle |
/// | Resource | 2 | Resource read and delete |
/// | Version | 6 | Version writes, reads, deletes and ordering |
/// | Meta | 3 | Default version management |
///
/// # Example
///
/// ```ignore
/// use xreg_executor::Command;
///
/// let cmd = Command::VersionGet {
///     group_type: "dirs".into(),
///     group_id: "d1".into(),
///     resource_type: "files".into(),
///     resource_id: "f1".into(),
///     version_id: "v1".into(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    // ==================== Registry (5) ====================
    /// Health check.
    /// Returns: `Output::Pong`
    Ping,

    /// Read the Registry entity.
    /// Returns: `Output::Registry`
    RegistryGet,

    /// Read the model in force.
    /// Returns: `Output::Model`
    ModelGet,

    /// Replace the model.
    /// Returns: `Output::Unit`
    ModelUpdate {
        /// New model
        model: RegistryModel,
    },

    /// Persist the snapshot now.
    /// Returns: `Output::Unit`
    Flush,

    // ==================== Group (4) ====================
    /// Create an empty group.
    /// Returns: `Output::Group`
    GroupCreate {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Extension attributes
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: Attributes,
    },

    /// Read one group.
    /// Returns: `Output::Group`
    GroupGet {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
    },

    /// List the groups of one type.
    /// Returns: `Output::Groups`
    GroupList {
        /// Plural group type
        group_type: String,
    },

    /// Delete a group and every resource in it.
    /// Returns: `Output::Unit`
    GroupDelete {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
    },

    // ==================== Resource (2) ====================
    /// Read a resource through its default version.
    /// Returns: `Output::Resource`
    ResourceGet {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
    },

    /// Delete a resource with all its versions.
    /// Returns: `Output::Unit`
    ResourceDelete {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
    },

    // ==================== Version (6) ====================
    /// Create or update versions keyed by ID, creating the resource if needed.
    /// Returns: `Output::VersionsWritten`
    VersionsPut {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
        /// Proposed versions keyed by version ID
        versions: BTreeMap<String, VersionProposal>,
        /// Pin the default to this version after the write
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set_default_version_id: Option<String>,
    },

    /// Create one version under a server-generated ID.
    /// Returns: `Output::VersionsWritten`
    VersionCreate {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
        /// Proposed fields
        #[serde(default)]
        version: VersionProposal,
        /// Pin the default to this version after the write
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set_default_version_id: Option<String>,
    },

    /// Read one version.
    /// Returns: `Output::Version`
    VersionGet {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
        /// Version ID
        version_id: String,
    },

    /// List every version in ancestor-respecting order.
    /// Returns: `Output::Versions`
    VersionList {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
    },

    /// Delete versions, optionally naming the new default.
    /// Returns: `Output::MaybeResource` (`None` when the resource went away)
    VersionsDelete {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
        /// Versions to delete
        version_ids: Vec<String>,
        /// Replacement default, pinned after the delete
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set_default_version_id: Option<String>,
    },

    /// `{id, ancestor, position}` of every version, in order.
    /// Returns: `Output::Ordered`
    VersionsOrdered {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
    },

    // ==================== Meta (3) ====================
    /// Read a resource's meta.
    /// Returns: `Output::Meta`
    MetaGet {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
    },

    /// Update the default version pointer and mode.
    /// Returns: `Output::Meta`
    MetaUpdate {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
        /// The update
        update: MetaUpdate,
    },

    /// Switch default-version stickiness.
    /// Returns: `Output::Meta`
    DefaultVersionSticky {
        /// Plural group type
        group_type: String,
        /// Group ID
        group_id: String,
        /// Plural resource type
        resource_type: String,
        /// Resource ID
        resource_id: String,
        /// New stickiness
        sticky: bool,
        /// Version to pin; the current default when omitted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version_id: Option<String>,
    },
}

impl Command {
    /// Variant name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "Ping",
            Command::RegistryGet => "RegistryGet",
            Command::ModelGet => "ModelGet",
            Command::ModelUpdate { .. } => "ModelUpdate",
            Command::Flush => "Flush",
            Command::GroupCreate { .. } => "GroupCreate",
            Command::GroupGet { .. } => "GroupGet",
            Command::GroupList { .. } => "GroupList",
            Command::GroupDelete { .. } => "GroupDelete",
            Command::ResourceGet { .. } => "ResourceGet",
            Command::ResourceDelete { .. } => "ResourceDelete",
            Command::VersionsPut { .. } => "VersionsPut",
            Command::VersionCreate { .. } => "VersionCreate",
            Command::VersionGet { .. } => "VersionGet",
            Command::VersionList { .. } => "VersionList",
            Command::VersionsDelete { .. } => "VersionsDelete",
            Command::VersionsOrdered { .. } => "VersionsOrdered",
            Command::MetaGet { .. } => "MetaGet",
            Command::MetaUpdate { .. } => "MetaUpdate",
            Command::DefaultVersionSticky { .. } => "DefaultVersionSticky",
        }
    }

    /// Whether the command only reads
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::Ping
                | Command::RegistryGet
                | Command::ModelGet
                | Command::GroupGet { .. }
                | Command::GroupList { .. }
                | Command::ResourceGet { .. }
                | Command::VersionGet { .. }
                | Command::VersionList { .. }
                | Command::VersionsOrdered { .. }
                | Command::MetaGet { .. }
        )
    }
}
