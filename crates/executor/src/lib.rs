//! # xRegistry Executor
//!
//! The command interface of the version ancestry engine.
//!
//! It provides:
//! - [`Executor`] - stateless dispatcher over a [`Registry`]
//! - [`Command`]/[`Output`] - the serializable instruction set (for SDKs and
//!   the HTTP layer)
//! - [`Error`] - structured, serializable errors carrying the entity path
//!
//! ## Quick Start
//!
//! ```text
//! use xreg_executor::{Command, Executor, Registry};
//!
//! let executor = Executor::new(Registry::ephemeral()?);
//! executor.execute(Command::GroupCreate {
//!     group_type: "dirs".into(),
//!     group_id: "d1".into(),
//!     attributes: Default::default(),
//! })?;
//! ```

#![warn(missing_docs)]

pub(crate) mod bridge;
mod command;
mod convert;
mod error;
mod executor;
mod output;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

pub use command::Command;
pub use error::Error;
pub use executor::Executor;
pub use output::Output;

// Re-export the engine handle and request types so users don't need the
// lower crates directly
pub use xreg_core::{
    GroupModel, MetaUpdate, RegistryModel, ResourceModel, VersionProposal, WriteOptions,
};
pub use xreg_engine::{
    Position, Registry, RegistryConfig, VersionAncestor, VersionsWritten, CONFIG_FILE_NAME,
};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
