//! Shared helpers for engine integration tests

#![allow(dead_code)]

use std::sync::{Arc, Once};

use tracing_subscriber::EnvFilter;
use xreg_core::{
    Attributes, GroupId, GroupKey, GroupModel, RegistryModel, ResourceKey, ResourceModel, Result,
    Timestamp, VersionId, VersionProposal, WriteOptions,
};
use xreg_engine::{Registry, VersionsWritten};

static INIT: Once = Once::new();

/// Install a `RUST_LOG`-driven subscriber once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn vid(s: &str) -> VersionId {
    VersionId::new_unchecked(s)
}

pub fn group() -> GroupKey {
    GroupKey::new("dirs", GroupId::new_unchecked("d1"))
}

pub fn file(id: &str) -> ResourceKey {
    ResourceKey::parse("dirs", "d1", "files", id).unwrap()
}

/// Midnight UTC on January 1st of `year`
pub fn year(year: u32) -> Timestamp {
    Timestamp::parse_rfc3339(&format!("{}-01-01T00:00:00Z", year)).unwrap()
}

/// Model with one `dirs`/`files` pair using `files`
pub fn model_with(files: ResourceModel) -> RegistryModel {
    RegistryModel::new().with_group("dirs", GroupModel::new("dir").with_resource("files", files))
}

/// Ephemeral registry with the default model and group `d1`
pub fn registry() -> Arc<Registry> {
    registry_with(ResourceModel::new("file"))
}

/// Ephemeral registry whose `files` type uses `files` and group `d1`
pub fn registry_with(files: ResourceModel) -> Arc<Registry> {
    init_tracing();
    let reg = Registry::ephemeral_with_model(model_with(files)).unwrap();
    reg.create_group(group(), Attributes::new()).unwrap();
    reg
}

pub fn proposal() -> VersionProposal {
    VersionProposal::new()
}

/// Write a batch to resource `f1`
pub fn put(reg: &Registry, entries: Vec<(&str, VersionProposal)>) -> Result<VersionsWritten> {
    put_to(reg, &file("f1"), entries)
}

pub fn put_to(
    reg: &Registry,
    key: &ResourceKey,
    entries: Vec<(&str, VersionProposal)>,
) -> Result<VersionsWritten> {
    let batch = entries.into_iter().map(|(id, p)| (vid(id), p)).collect();
    reg.create_or_update_versions(key, batch, &WriteOptions::default())
}

/// Ordered version IDs of resource `f1`
pub fn order(reg: &Registry) -> Vec<String> {
    reg.ordered_versions(&file("f1"))
        .unwrap()
        .into_iter()
        .map(|v| v.id.into_inner())
        .collect()
}
