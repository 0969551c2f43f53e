//! Test modules for the executor crate.


use std::sync::Arc;

use xreg_engine::Registry;

use crate::{Command, Executor};

/// Executor over an ephemeral registry with group `dirs/d1`
pub(crate) fn create_test_executor() -> Executor {
    let executor = Executor::new(Registry::ephemeral().unwrap());
    executor
        .execute(Command::GroupCreate {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            attributes: Default::default(),
        })
        .unwrap();
    executor
}

pub(crate) fn registry_of(executor: &Executor) -> Arc<Registry> {
    Arc::clone(executor.registry())
}
