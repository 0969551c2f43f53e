//! Resource command handlers.

use std::sync::Arc;

use xreg_core::ResourceKey;
use xreg_engine::Registry;

use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle ResourceGet command.
pub fn resource_get(reg: &Arc<Registry>, key: ResourceKey) -> Result<Output> {
    let view = convert_result(reg.get_resource(&key))?;
    Ok(Output::Resource(view))
}

/// Handle ResourceDelete command.
pub fn resource_delete(reg: &Arc<Registry>, key: ResourceKey) -> Result<Output> {
    convert_result(reg.delete_resource(&key))?;
    Ok(Output::Unit)
}
