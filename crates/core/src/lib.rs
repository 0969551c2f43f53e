//! Core types for the registry
//!
//! This crate defines the foundational types used throughout the system:
//! - GroupId, ResourceId, VersionId: validated entity IDs
//! - GroupKey, ResourceKey: entity addresses
//! - Contract types: EntityPath, Epoch, Timestamp
//! - Entity records and read views (Registry, Group, Resource, Meta, Version)
//! - Model types: RegistryModel, GroupModel, ResourceModel
//! - Request types: VersionProposal, WriteOptions, MetaUpdate
//! - Error: the RegistryError taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod entities;
pub mod error;
pub mod model;
pub mod request;
pub mod types;

pub use contract::{validate_xid, EntityPath, Epoch, Timestamp, XidError, MAX_XID_LENGTH};
pub use entities::{
    Attributes, GroupRecord, GroupView, MetaRecord, MetaView, RegistryRecord, RegistryView,
    ResourceRecord, ResourceView, Stamps, VersionRecord, VersionView,
};
pub use error::{RegistryError, Result};
pub use model::{GroupModel, RegistryModel, ResourceModel};
pub use request::{MetaUpdate, VersionProposal, WriteOptions};
pub use types::{GroupId, GroupKey, ResourceId, ResourceKey, VersionId};
