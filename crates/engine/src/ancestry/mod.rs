//! Version ancestry of a single resource
//!
//! - `graph`: arena of ancestor edges with staged changes and rollback
//! - `cycle`: cycle detection reporting every member
//! - `order`: deterministic ancestor-respecting order and positions
//! - `root`: the single-root policy
//! - `default_version`: floating and sticky default selection
//! - `prune`: retention cap enforcement

pub mod cycle;
pub mod default_version;
pub mod graph;
pub mod order;
pub mod prune;
pub mod root;

pub use cycle::{check_acyclic, cycle_members, has_cycle};
pub use default_version::{DefaultMode, DefaultVersionSelector};
pub use graph::{AncestryGraph, AncestryNode, Children};
pub use order::{compare_age, ordered_versions, root_count, Position, VersionAncestor};
pub use prune::{PruneReport, RetentionPruner};
pub use root::RootConstraint;
