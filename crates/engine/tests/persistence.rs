//! Snapshot, config file and reopen behaviour

mod common;

use common::*;
use tempfile::TempDir;
use xreg_core::{Attributes, Epoch, ResourceModel};
use xreg_engine::{Registry, RegistryConfig, CONFIG_FILE_NAME};

fn open_with(dir: &TempDir, files: ResourceModel) -> std::sync::Arc<Registry> {
    init_tracing();
    let reg = Registry::open_with_config(dir.path(), RegistryConfig::with_model(model_with(files)))
        .unwrap();
    if reg.get_group(&group()).is_err() {
        reg.create_group(group(), Attributes::new()).unwrap();
    }
    reg
}

#[test]
fn test_reopen_restores_graph_and_meta() {
    let dir = TempDir::new().unwrap();
    let (ordered_before, meta_before) = {
        let reg = open_with(&dir, ResourceModel::new("file"));
        put(
            &reg,
            vec![
                ("v1", proposal().with_created_at(year(2020))),
                ("v2", proposal().with_created_at(year(2021))),
                ("x", proposal().with_ancestor(vid("x")).with_created_at(year(2019))),
            ],
        )
        .unwrap();
        reg.set_default_version_sticky(&file("f1"), true, Some(vid("v1"))).unwrap();
        let ordered = reg.ordered_versions(&file("f1")).unwrap();
        let meta = reg.get_meta(&file("f1")).unwrap();
        reg.shutdown().unwrap();
        (ordered, meta)
    };

    let reg = Registry::open(dir.path()).unwrap();
    assert_eq!(reg.ordered_versions(&file("f1")).unwrap(), ordered_before);
    assert_eq!(reg.get_meta(&file("f1")).unwrap(), meta_before);
    assert_eq!(
        reg.get_version(&file("f1"), &vid("x")).unwrap().record.stamps.created_at,
        year(2019)
    );
}

#[test]
fn test_drop_flushes_snapshot() {
    let dir = TempDir::new().unwrap();
    {
        let reg = open_with(&dir, ResourceModel::new("file"));
        put(&reg, vec![("v1", proposal())]).unwrap();
    }
    assert!(xreg_storage::snapshot_path(dir.path()).exists());

    let reg = Registry::open(dir.path()).unwrap();
    assert_eq!(order(&reg), vec!["v1"]);
    assert_eq!(reg.get_group(&group()).unwrap().resource_counts["files"], 1);
}

#[test]
fn test_clock_moves_forward_after_reopen() {
    let dir = TempDir::new().unwrap();
    let last = {
        let reg = open_with(&dir, ResourceModel::new("file"));
        put(&reg, vec![("v1", proposal())]).unwrap();
        put(&reg, vec![("v1", proposal())]).unwrap();
        reg.get_version(&file("f1"), &vid("v1")).unwrap().record.stamps.modified_at
    };

    let reg = Registry::open(dir.path()).unwrap();
    put(&reg, vec![("v1", proposal())]).unwrap();
    let v1 = reg.get_version(&file("f1"), &vid("v1")).unwrap();
    assert!(v1.record.stamps.modified_at > last);
    assert_eq!(v1.record.stamps.epoch, Epoch::new(3));
}

#[test]
fn test_config_file_model_wins_over_snapshot() {
    let dir = TempDir::new().unwrap();
    {
        let reg = open_with(&dir, ResourceModel::new("file"));
        for v in ["v1", "v2", "v3"] {
            put(&reg, vec![(v, proposal())]).unwrap();
        }
    }

    let capped = RegistryConfig::with_model(model_with(ResourceModel::new("file").with_max_versions(2)));
    capped.write_to_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

    let reg = Registry::open(dir.path()).unwrap();
    assert_eq!(
        reg.model().resource("dirs", "files").unwrap().max_versions,
        2
    );
    // the cap applies to the next write, existing data is untouched
    assert_eq!(order(&reg), vec!["v1", "v2", "v3"]);
    let written = put(&reg, vec![("v4", proposal())]).unwrap();
    assert_eq!(written.pruned, vec![vid("v1"), vid("v2")]);
}

#[test]
fn test_registry_id_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let reg = open_with(&dir, ResourceModel::new("file"));
        reg.get_registry().record.id
    };
    let reg = Registry::open(dir.path()).unwrap();
    assert_eq!(reg.get_registry().record.id, id);
    assert_eq!(reg.config().registry_id.as_deref(), Some(id.as_str()));
}

#[test]
fn test_model_update_is_written_to_config() {
    let dir = TempDir::new().unwrap();
    {
        let reg = open_with(&dir, ResourceModel::new("file"));
        reg.update_model(model_with(ResourceModel::new("file").with_single_version_root(true)))
            .unwrap();
    }
    let cfg = RegistryConfig::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert!(cfg.model().resource("dirs", "files").unwrap().single_version_root);
}
