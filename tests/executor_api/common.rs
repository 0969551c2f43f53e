//! Common test utilities for executor API tests

use std::path::Path;
use std::sync::{Arc, Once};

use tracing_subscriber::EnvFilter;

use xreg_core::VersionId;
use xregistry::{Command, Executor, Output, Registry, VersionProposal};

static INIT: Once = Once::new();

/// Route engine logs to the test writer; `RUST_LOG=xreg=debug` to see them
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Create an executor over an in-memory registry with group `dirs/d1`
pub fn create_executor() -> Executor {
    init_tracing();
    with_group(Executor::new(Registry::ephemeral().unwrap()))
}

/// Create an executor over a registry stored in `dir`
pub fn open_executor(dir: &Path) -> Executor {
    init_tracing();
    Executor::new(Registry::open(dir).unwrap())
}

/// Create group `dirs/d1` and hand the executor back
pub fn with_group(executor: Executor) -> Executor {
    executor
        .execute(Command::GroupCreate {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            attributes: Default::default(),
        })
        .unwrap();
    executor
}

/// VersionsPut for `dirs/d1/files/{resource}` from `(id, ancestor)` pairs
pub fn put(resource: &str, versions: &[(&str, Option<&str>)]) -> Command {
    Command::VersionsPut {
        group_type: "dirs".into(),
        group_id: "d1".into(),
        resource_type: "files".into(),
        resource_id: resource.into(),
        versions: versions
            .iter()
            .map(|(id, ancestor)| {
                let proposal = match ancestor {
                    Some(a) => VersionProposal::new().with_ancestor(VersionId::new_unchecked(*a)),
                    None => VersionProposal::new(),
                };
                (id.to_string(), proposal)
            })
            .collect(),
        set_default_version_id: None,
    }
}

/// VersionsOrdered for `dirs/d1/files/{resource}`
pub fn ordered_cmd(resource: &str) -> Command {
    Command::VersionsOrdered {
        group_type: "dirs".into(),
        group_id: "d1".into(),
        resource_type: "files".into(),
        resource_id: resource.into(),
    }
}

/// MetaGet for `dirs/d1/files/{resource}`
pub fn meta_cmd(resource: &str) -> Command {
    Command::MetaGet {
        group_type: "dirs".into(),
        group_id: "d1".into(),
        resource_type: "files".into(),
        resource_id: resource.into(),
    }
}

/// Ordered version ids of a resource
pub fn ordered_ids(executor: &Executor, resource: &str) -> Vec<String> {
    match executor.execute(ordered_cmd(resource)).unwrap() {
        Output::Ordered(order) => order.into_iter().map(|v| v.id.into_inner()).collect(),
        other => panic!("Expected Output::Ordered, got {:?}", other),
    }
}

/// Default version id of a resource
pub fn default_id(executor: &Executor, resource: &str) -> String {
    match executor.execute(meta_cmd(resource)).unwrap() {
        Output::Meta(meta) => meta.record.default_version_id.into_inner(),
        other => panic!("Expected Output::Meta, got {:?}", other),
    }
}

/// The registry behind an executor
#[allow(dead_code)]
pub fn registry(executor: &Executor) -> Arc<Registry> {
    Arc::clone(executor.registry())
}
