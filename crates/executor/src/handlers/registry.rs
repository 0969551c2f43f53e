//! Registry-level command handlers.

use std::sync::Arc;

use xreg_core::RegistryModel;
use xreg_engine::Registry;

use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle Ping command.
pub fn ping() -> Result<Output> {
    Ok(Output::Pong {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle RegistryGet command.
pub fn registry_get(reg: &Arc<Registry>) -> Result<Output> {
    Ok(Output::Registry(reg.get_registry()))
}

/// Handle ModelGet command.
pub fn model_get(reg: &Arc<Registry>) -> Result<Output> {
    Ok(Output::Model(reg.model()))
}

/// Handle ModelUpdate command.
pub fn model_update(reg: &Arc<Registry>, model: RegistryModel) -> Result<Output> {
    convert_result(reg.update_model(model))?;
    Ok(Output::Unit)
}

/// Handle Flush command.
pub fn flush(reg: &Arc<Registry>) -> Result<Output> {
    convert_result(reg.flush())?;
    Ok(Output::Unit)
}
