//! Version ancestry engine for the registry
//!
//! This crate orchestrates all lower layers:
//! - ancestry: the per-resource version graph (cycles, order, roots,
//!   default version, retention)
//! - cascade: epoch bumps from Version up to the Registry
//! - resource: one resource mutation from staged edges to cascade
//! - Registry: the handle with open/close, config, model and every
//!   entity operation
//! - Transaction coordination
//!
//! The engine is the only component that knows about:
//! - Model policies (retention caps, single root, client IDs, stickiness)
//! - Cross-entity bookkeeping (group and registry epochs)
//! - Persistence (config file and snapshot)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ancestry;
pub mod cascade;
pub mod coordinator;
pub mod database;
pub mod resource;

pub use ancestry::{
    check_acyclic, cycle_members, has_cycle, ordered_versions, AncestryGraph, AncestryNode,
    DefaultMode, DefaultVersionSelector, Position, PruneReport, RetentionPruner, RootConstraint,
    VersionAncestor,
};
pub use cascade::EpochCascade;
pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use database::{Registry, RegistryConfig, VersionsWritten, CONFIG_FILE_NAME};
pub use resource::{next_version_id, ResourceChange, ResourceEngine};
