//! Group command handlers.

use std::sync::Arc;

use xreg_core::Attributes;
use xreg_engine::Registry;

use crate::bridge::group_key;
use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle GroupCreate command.
pub fn group_create(
    reg: &Arc<Registry>,
    group_type: String,
    group_id: String,
    attributes: Attributes,
) -> Result<Output> {
    let key = group_key(&group_type, &group_id)?;
    let view = convert_result(reg.create_group(key, attributes))?;
    Ok(Output::Group(view))
}

/// Handle GroupGet command.
pub fn group_get(reg: &Arc<Registry>, group_type: String, group_id: String) -> Result<Output> {
    let key = group_key(&group_type, &group_id)?;
    let view = convert_result(reg.get_group(&key))?;
    Ok(Output::Group(view))
}

/// Handle GroupList command.
pub fn group_list(reg: &Arc<Registry>, group_type: String) -> Result<Output> {
    let groups = convert_result(reg.list_groups(&group_type))?;
    Ok(Output::Groups(groups))
}

/// Handle GroupDelete command.
pub fn group_delete(reg: &Arc<Registry>, group_type: String, group_id: String) -> Result<Output> {
    let key = group_key(&group_type, &group_id)?;
    convert_result(reg.delete_group(&key))?;
    Ok(Output::Unit)
}
