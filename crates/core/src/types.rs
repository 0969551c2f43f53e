//! Core identifier types
//!
//! This module defines the identifiers used to address registry entities:
//! - GroupId, ResourceId, VersionId: validated entity IDs
//! - GroupKey: group type (plural) + group ID
//! - ResourceKey: group key + resource type (plural) + resource ID
//!
//! Keys render as the entity's path, e.g. `/dirs/d1/files/f1`.

use crate::contract::xid::{validate_xid, XidError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new ID, validating the input
            pub fn new(id: impl Into<String>) -> Result<Self, XidError> {
                let id = id.into();
                validate_xid(&id)?;
                Ok(Self(id))
            }

            /// Create an ID without validation
            ///
            /// The caller must ensure the ID is valid. Use `new()` for untrusted input.
            pub fn new_unchecked(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = XidError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// ID of a Group, unique within its group type
    GroupId
);

entity_id!(
    /// ID of a Resource, unique within its Group and resource type
    ResourceId
);

entity_id!(
    /// ID of a Version, unique within its Resource
    VersionId
);

impl VersionId {
    /// Ordering used to break ties between versions
    ///
    /// Case-insensitive comparison first; IDs that only differ in case fall
    /// back to byte order so the result stays total.
    pub fn cmp_case_insensitive(&self, other: &VersionId) -> Ordering {
        let a = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let b = other.0.bytes().map(|b| b.to_ascii_lowercase());
        a.cmp(b).then_with(|| self.0.cmp(&other.0))
    }
}

/// Address of a Group: `/<group_type>/<group_id>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Plural group type name from the model (e.g. `dirs`)
    pub group_type: String,
    /// Group ID
    pub group_id: GroupId,
}

impl GroupKey {
    /// Create a new group key
    pub fn new(group_type: impl Into<String>, group_id: GroupId) -> Self {
        Self {
            group_type: group_type.into(),
            group_id,
        }
    }

    /// Key of a Resource inside this Group
    pub fn resource(&self, resource_type: impl Into<String>, resource_id: ResourceId) -> ResourceKey {
        ResourceKey {
            group: self.clone(),
            resource_type: resource_type.into(),
            resource_id,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.group_type, self.group_id)
    }
}

/// Address of a Resource: `/<group_type>/<group_id>/<resource_type>/<resource_id>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Owning group
    pub group: GroupKey,
    /// Plural resource type name from the model (e.g. `files`)
    pub resource_type: String,
    /// Resource ID
    pub resource_id: ResourceId,
}

impl ResourceKey {
    /// Build a resource key from its four path segments
    pub fn new(
        group_type: impl Into<String>,
        group_id: GroupId,
        resource_type: impl Into<String>,
        resource_id: ResourceId,
    ) -> Self {
        GroupKey::new(group_type, group_id).resource(resource_type, resource_id)
    }

    /// Build a resource key from raw segments, validating both IDs
    pub fn parse(
        group_type: &str,
        group_id: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Self, XidError> {
        Ok(Self::new(
            group_type,
            GroupId::new(group_id)?,
            resource_type,
            ResourceId::new(resource_id)?,
        ))
    }

    /// The owning group's key
    pub fn group_key(&self) -> &GroupKey {
        &self.group
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.resource_type, self.resource_id)
    }
}
