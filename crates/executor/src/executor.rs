//! The Executor - single entry point to the registry engine.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! appropriate handler and converts results to outputs.

use std::sync::Arc;

use tracing::debug;
use xreg_engine::Registry;

use crate::bridge::resource_key;
use crate::handlers::{groups, meta, registry, resources, versions};
use crate::{Command, Output, Result};

/// The command executor - single entry point to the registry engine.
///
/// The Executor is **stateless**: it holds a reference to the registry but
/// maintains no state of its own. All state lives in the engine.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```ignore
/// use xreg_executor::{Command, Executor};
///
/// let executor = Executor::new(registry);
///
/// // Single command execution
/// let result = executor.execute(Command::RegistryGet)?;
///
/// // Batch execution
/// let results = executor.execute_many(vec![Command::Ping, Command::ModelGet]);
/// ```
#[derive(Clone)]
pub struct Executor {
    registry: Arc<Registry>,
}

impl Executor {
    /// Create a new executor wrapping a registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Execute a single command.
    ///
    /// Returns the command result or an error.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        let name = cmd.name();
        let result = self.dispatch(cmd);
        if let Err(e) = &result {
            debug!(target: "xreg::executor", command = name, error = %e, "Command failed");
        }
        result
    }

    fn dispatch(&self, cmd: Command) -> Result<Output> {
        let reg = &self.registry;
        match cmd {
            // Registry commands
            Command::Ping => registry::ping(),
            Command::RegistryGet => registry::registry_get(reg),
            Command::ModelGet => registry::model_get(reg),
            Command::ModelUpdate { model } => registry::model_update(reg, model),
            Command::Flush => registry::flush(reg),

            // Group commands
            Command::GroupCreate {
                group_type,
                group_id,
                attributes,
            } => groups::group_create(reg, group_type, group_id, attributes),
            Command::GroupGet {
                group_type,
                group_id,
            } => groups::group_get(reg, group_type, group_id),
            Command::GroupList { group_type } => groups::group_list(reg, group_type),
            Command::GroupDelete {
                group_type,
                group_id,
            } => groups::group_delete(reg, group_type, group_id),

            // Resource commands
            Command::ResourceGet {
                group_type,
                group_id,
                resource_type,
                resource_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                resources::resource_get(reg, key)
            }
            Command::ResourceDelete {
                group_type,
                group_id,
                resource_type,
                resource_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                resources::resource_delete(reg, key)
            }

            // Version commands
            Command::VersionsPut {
                group_type,
                group_id,
                resource_type,
                resource_id,
                versions: batch,
                set_default_version_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                versions::versions_put(reg, key, batch, set_default_version_id)
            }
            Command::VersionCreate {
                group_type,
                group_id,
                resource_type,
                resource_id,
                version,
                set_default_version_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                versions::version_create(reg, key, version, set_default_version_id)
            }
            Command::VersionGet {
                group_type,
                group_id,
                resource_type,
                resource_id,
                version_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                versions::version_get(reg, key, version_id)
            }
            Command::VersionList {
                group_type,
                group_id,
                resource_type,
                resource_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                versions::version_list(reg, key)
            }
            Command::VersionsDelete {
                group_type,
                group_id,
                resource_type,
                resource_id,
                version_ids,
                set_default_version_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                versions::versions_delete(reg, key, version_ids, set_default_version_id)
            }
            Command::VersionsOrdered {
                group_type,
                group_id,
                resource_type,
                resource_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                versions::versions_ordered(reg, key)
            }

            // Meta commands
            Command::MetaGet {
                group_type,
                group_id,
                resource_type,
                resource_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                meta::meta_get(reg, key)
            }
            Command::MetaUpdate {
                group_type,
                group_id,
                resource_type,
                resource_id,
                update,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                meta::meta_update(reg, key, update)
            }
            Command::DefaultVersionSticky {
                group_type,
                group_id,
                resource_type,
                resource_id,
                sticky,
                version_id,
            } => {
                let key = resource_key(&group_type, &group_id, &resource_type, &resource_id)?;
                meta::default_version_sticky(reg, key, sticky, version_id)
            }
        }
    }

    /// Execute multiple commands sequentially.
    ///
    /// Returns all results in the same order as the input commands.
    /// Execution continues even if some commands fail.
    pub fn execute_many(&self, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(cmd)).collect()
    }

    /// Get a reference to the underlying registry.
    ///
    /// This is an escape hatch for advanced use cases.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
