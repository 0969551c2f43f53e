//! Output enum for command execution results.
//!
//! Every command produces exactly one output type. This mapping is deterministic:
//! the same command always produces the same output variant (though the values
//! may differ based on registry state).

use serde::{Deserialize, Serialize};
use xreg_core::{GroupView, MetaView, RegistryModel, RegistryView, ResourceView, VersionView};
use xreg_engine::{VersionAncestor, VersionsWritten};

/// Successful command execution results.
///
/// Each [`Command`](crate::Command) variant maps to exactly one `Output` variant.
///
/// # Example
///
/// ```text
/// use xreg_executor::{Command, Output};
///
/// match executor.execute(Command::MetaGet { .. })? {
///     Output::Meta(meta) => println!("default: {}", meta.record.default_version_id),
///     _ => unreachable!("MetaGet always returns Meta"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// No return value (deletes, model update, flush)
    Unit,

    /// Ping response
    Pong {
        /// Engine version string.
        version: String,
    },

    /// The Registry entity
    Registry(RegistryView),

    /// The model in force
    Model(RegistryModel),

    /// One group
    Group(GroupView),

    /// Groups of one type
    Groups(Vec<GroupView>),

    /// One resource
    Resource(ResourceView),

    /// A resource that may have been deleted
    MaybeResource(Option<ResourceView>),

    /// Result of a version write
    VersionsWritten(VersionsWritten),

    /// One version
    Version(VersionView),

    /// Versions in order
    Versions(Vec<VersionView>),

    /// Ordered `{id, ancestor, position}` entries
    Ordered(Vec<VersionAncestor>),

    /// A resource's meta
    Meta(MetaView),
}
