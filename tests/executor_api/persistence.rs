//! Persistence Tests
//!
//! Registries opened from a directory keep their state across close and
//! reopen, and read their model from `xregistry.toml`.

use crate::common::*;
use std::sync::Arc;
use xregistry::{Command, Output};

#[test]
fn versions_and_default_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let executor = with_group(open_executor(dir.path()));
        executor
            .execute(put("f1", &[("v1", None), ("v2", Some("v1"))]))
            .unwrap();
        executor
            .execute(Command::DefaultVersionSticky {
                group_type: "dirs".into(),
                group_id: "d1".into(),
                resource_type: "files".into(),
                resource_id: "f1".into(),
                sticky: true,
                version_id: Some("v1".into()),
            })
            .unwrap();
        executor.execute(Command::Flush).unwrap();
    }

    let executor = open_executor(dir.path());
    assert_eq!(ordered_ids(&executor, "f1"), vec!["v1", "v2"]);
    match executor.execute(meta_cmd("f1")).unwrap() {
        Output::Meta(meta) => {
            assert!(meta.record.default_version_sticky);
            assert_eq!(meta.record.default_version_id.as_str(), "v1");
            assert_eq!(meta.versions_count, 2);
        }
        other => panic!("Expected Output::Meta, got {:?}", other),
    }
}

#[test]
fn reopening_a_live_directory_shares_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let first = open_executor(dir.path());
    let second = open_executor(dir.path());
    assert!(Arc::ptr_eq(&registry(&first), &registry(&second)));
}

#[test]
fn registry_id_is_stable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let executor = open_executor(dir.path());
        match executor.execute(Command::RegistryGet).unwrap() {
            Output::Registry(view) => view.record.id,
            other => panic!("Expected Output::Registry, got {:?}", other),
        }
    };
    assert!(!id.is_empty());

    let executor = open_executor(dir.path());
    match executor.execute(Command::RegistryGet).unwrap() {
        Output::Registry(view) => assert_eq!(view.record.id, id),
        other => panic!("Expected Output::Registry, got {:?}", other),
    }
}

#[test]
fn config_file_sets_the_retention_cap() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(xregistry::CONFIG_FILE_NAME),
        r#"
registry_id = "reg-from-file"

[groups.dirs]
singular = "dir"

[groups.dirs.resources.files]
singular = "file"
max_versions = 1
"#,
    )
    .unwrap();

    let executor = with_group(open_executor(dir.path()));
    executor.execute(put("f1", &[("v1", None)])).unwrap();
    match executor.execute(put("f1", &[("v2", None)])).unwrap() {
        Output::VersionsWritten(written) => {
            assert_eq!(written.pruned.len(), 1);
            assert_eq!(written.pruned[0].as_str(), "v1");
            assert_eq!(written.default_version_id.as_str(), "v2");
        }
        other => panic!("Expected Output::VersionsWritten, got {:?}", other),
    }
    match executor.execute(Command::RegistryGet).unwrap() {
        Output::Registry(view) => assert_eq!(view.record.id, "reg-from-file"),
        other => panic!("Expected Output::Registry, got {:?}", other),
    }
}
