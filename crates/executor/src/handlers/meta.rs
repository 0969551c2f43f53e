//! Meta command handlers.

use std::sync::Arc;

use xreg_core::{MetaUpdate, ResourceKey};
use xreg_engine::Registry;

use crate::bridge::maybe_version_id;
use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle MetaGet command.
pub fn meta_get(reg: &Arc<Registry>, key: ResourceKey) -> Result<Output> {
    let meta = convert_result(reg.get_meta(&key))?;
    Ok(Output::Meta(meta))
}

/// Handle MetaUpdate command.
pub fn meta_update(reg: &Arc<Registry>, key: ResourceKey, update: MetaUpdate) -> Result<Output> {
    let meta = convert_result(reg.update_meta(&key, &update))?;
    Ok(Output::Meta(meta))
}

/// Handle DefaultVersionSticky command.
pub fn default_version_sticky(
    reg: &Arc<Registry>,
    key: ResourceKey,
    sticky: bool,
    version_id: Option<String>,
) -> Result<Output> {
    let id = maybe_version_id(version_id.as_deref())?;
    let meta = convert_result(reg.set_default_version_sticky(&key, sticky, id))?;
    Ok(Output::Meta(meta))
}
