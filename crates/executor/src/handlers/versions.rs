//! Version command handlers.
//!
//! Writes arrive as a map keyed by version ID, as in an HTTP body. The map
//! order does not matter: the engine sorts unanchored versions by age.

use std::collections::BTreeMap;
use std::sync::Arc;

use xreg_core::{ResourceKey, VersionProposal, WriteOptions};
use xreg_engine::Registry;

use crate::bridge::{maybe_version_id, version_id, version_ids};
use crate::convert::convert_result;
use crate::{Output, Result};

fn write_options(set_default_version_id: Option<String>) -> Result<WriteOptions> {
    Ok(WriteOptions {
        set_default_version_id: maybe_version_id(set_default_version_id.as_deref())?,
    })
}

/// Handle VersionsPut command.
pub fn versions_put(
    reg: &Arc<Registry>,
    key: ResourceKey,
    versions: BTreeMap<String, VersionProposal>,
    set_default_version_id: Option<String>,
) -> Result<Output> {
    let options = write_options(set_default_version_id)?;
    let batch = versions
        .into_iter()
        .map(|(id, proposal)| Ok((version_id(&id)?, proposal)))
        .collect::<Result<Vec<_>>>()?;
    let written = convert_result(reg.create_or_update_versions(&key, batch, &options))?;
    Ok(Output::VersionsWritten(written))
}

/// Handle VersionCreate command.
pub fn version_create(
    reg: &Arc<Registry>,
    key: ResourceKey,
    version: VersionProposal,
    set_default_version_id: Option<String>,
) -> Result<Output> {
    let options = write_options(set_default_version_id)?;
    let written = convert_result(reg.create_version(&key, version, &options))?;
    Ok(Output::VersionsWritten(written))
}

/// Handle VersionGet command.
pub fn version_get(reg: &Arc<Registry>, key: ResourceKey, id: String) -> Result<Output> {
    let id = version_id(&id)?;
    let view = convert_result(reg.get_version(&key, &id))?;
    Ok(Output::Version(view))
}

/// Handle VersionList command.
pub fn version_list(reg: &Arc<Registry>, key: ResourceKey) -> Result<Output> {
    let versions = convert_result(reg.list_versions(&key))?;
    Ok(Output::Versions(versions))
}

/// Handle VersionsDelete command.
pub fn versions_delete(
    reg: &Arc<Registry>,
    key: ResourceKey,
    ids: Vec<String>,
    set_default_version_id: Option<String>,
) -> Result<Output> {
    let ids = version_ids(&ids)?;
    let replacement = maybe_version_id(set_default_version_id.as_deref())?;
    let view = convert_result(reg.delete_versions(&key, &ids, replacement.as_ref()))?;
    Ok(Output::MaybeResource(view))
}

/// Handle VersionsOrdered command.
pub fn versions_ordered(reg: &Arc<Registry>, key: ResourceKey) -> Result<Output> {
    let ordered = convert_result(reg.ordered_versions(&key))?;
    Ok(Output::Ordered(ordered))
}
