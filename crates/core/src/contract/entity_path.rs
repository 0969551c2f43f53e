//! Universal entity address
//!
//! Every error raised by the registry names the entity it is about. The HTTP
//! layer renders that address as the request's subject; inside the engine it
//! is an `EntityPath`.
//!
//! ```
//! use xreg_core::{EntityPath, ResourceKey, VersionId};
//!
//! let key = ResourceKey::parse("dirs", "d1", "files", "f1").unwrap();
//! let path = EntityPath::version(key, VersionId::new("v2").unwrap());
//! assert_eq!(path.to_string(), "/dirs/d1/files/f1/versions/v2");
//! ```

use crate::types::{GroupKey, ResourceKey, VersionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of any entity in the registry
///
/// ## Invariants
///
/// - The Registry itself renders as `/`
/// - Every other variant renders as its parent's path plus its own segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityPath {
    /// The registry root
    Registry,
    /// A Group
    Group(GroupKey),
    /// A Resource
    Resource(ResourceKey),
    /// A Resource's Meta sub-entity
    Meta(ResourceKey),
    /// A Version of a Resource
    Version {
        /// Owning resource
        resource: ResourceKey,
        /// Version ID
        version_id: VersionId,
    },
}

impl EntityPath {
    /// Path of a Version
    pub fn version(resource: ResourceKey, version_id: VersionId) -> Self {
        EntityPath::Version {
            resource,
            version_id,
        }
    }

    /// The resource this path lives under, if any
    pub fn resource_key(&self) -> Option<&ResourceKey> {
        match self {
            EntityPath::Resource(key) | EntityPath::Meta(key) => Some(key),
            EntityPath::Version { resource, .. } => Some(resource),
            EntityPath::Registry | EntityPath::Group(_) => None,
        }
    }

    /// Containing entity (Version → Resource, Meta → Resource, Resource → Group, Group → Registry)
    pub fn parent(&self) -> Option<EntityPath> {
        match self {
            EntityPath::Registry => None,
            EntityPath::Group(_) => Some(EntityPath::Registry),
            EntityPath::Resource(key) => Some(EntityPath::Group(key.group.clone())),
            EntityPath::Meta(key) | EntityPath::Version { resource: key, .. } => {
                Some(EntityPath::Resource(key.clone()))
            }
        }
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityPath::Registry => f.write_str("/"),
            EntityPath::Group(key) => write!(f, "{}", key),
            EntityPath::Resource(key) => write!(f, "{}", key),
            EntityPath::Meta(key) => write!(f, "{}/meta", key),
            EntityPath::Version {
                resource,
                version_id,
            } => write!(f, "{}/versions/{}", resource, version_id),
        }
    }
}

impl From<GroupKey> for EntityPath {
    fn from(key: GroupKey) -> Self {
        EntityPath::Group(key)
    }
}

impl From<ResourceKey> for EntityPath {
    fn from(key: ResourceKey) -> Self {
        EntityPath::Resource(key)
    }
}
