//! Lifecycle Tests
//!
//! Groups, resources and versions driven end to end through commands.

use crate::common::*;
use serde_json::json;
use xregistry::{Command, Output, Position};

// ============================================================================
// Groups
// ============================================================================

#[test]
fn group_create_list_delete_tracks_registry_counts() {
    let executor = create_executor();
    executor
        .execute(Command::GroupCreate {
            group_type: "dirs".into(),
            group_id: "d2".into(),
            attributes: [("owner".to_string(), json!("ops"))].into_iter().collect(),
        })
        .unwrap();

    match executor
        .execute(Command::GroupList {
            group_type: "dirs".into(),
        })
        .unwrap()
    {
        Output::Groups(groups) => {
            let ids: Vec<_> = groups.iter().map(|g| g.record.key.to_string()).collect();
            assert_eq!(ids, vec!["/dirs/d1", "/dirs/d2"]);
            assert_eq!(groups[1].record.attributes["owner"], json!("ops"));
        }
        other => panic!("Expected Output::Groups, got {:?}", other),
    }

    let epoch_before = match executor.execute(Command::RegistryGet).unwrap() {
        Output::Registry(view) => {
            assert_eq!(view.group_counts["dirs"], 2);
            view.record.stamps.epoch
        }
        other => panic!("Expected Output::Registry, got {:?}", other),
    };

    executor
        .execute(Command::GroupDelete {
            group_type: "dirs".into(),
            group_id: "d2".into(),
        })
        .unwrap();

    match executor.execute(Command::RegistryGet).unwrap() {
        Output::Registry(view) => {
            assert_eq!(view.group_counts["dirs"], 1);
            assert!(view.record.stamps.epoch > epoch_before);
        }
        other => panic!("Expected Output::Registry, got {:?}", other),
    }
}

#[test]
fn first_version_creates_resource_and_counts_it() {
    let executor = create_executor();
    match executor.execute(put("f1", &[("v1", None)])).unwrap() {
        Output::VersionsWritten(written) => {
            assert!(written.resource_created);
            assert!(written.pruned.is_empty());
            assert_eq!(written.default_version_id.as_str(), "v1");
        }
        other => panic!("Expected Output::VersionsWritten, got {:?}", other),
    }

    match executor
        .execute(Command::GroupGet {
            group_type: "dirs".into(),
            group_id: "d1".into(),
        })
        .unwrap()
    {
        Output::Group(view) => assert_eq!(view.resource_counts["files"], 1),
        other => panic!("Expected Output::Group, got {:?}", other),
    }

    executor
        .execute(Command::ResourceDelete {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            resource_type: "files".into(),
            resource_id: "f1".into(),
        })
        .unwrap();

    match executor
        .execute(Command::GroupGet {
            group_type: "dirs".into(),
            group_id: "d1".into(),
        })
        .unwrap()
    {
        Output::Group(view) => assert_eq!(view.resource_counts["files"], 0),
        other => panic!("Expected Output::Group, got {:?}", other),
    }
}

// ============================================================================
// Versions
// ============================================================================

#[test]
fn json_batch_with_branches_is_ordered_ancestor_first() {
    let executor = create_executor();
    let cmd: Command = serde_json::from_value(json!({
        "VersionsPut": {
            "group_type": "dirs",
            "group_id": "d1",
            "resource_type": "files",
            "resource_id": "f1",
            "versions": {
                "v3": { "ancestor": "v1" },
                "v2": { "ancestor": "v1" },
                "v1": {}
            }
        }
    }))
    .unwrap();
    executor.execute(cmd).unwrap();

    match executor.execute(ordered_cmd("f1")).unwrap() {
        Output::Ordered(order) => {
            assert_eq!(order[0].id.as_str(), "v1");
            assert_eq!(order[0].position, Position::Root);
            assert!(order[1..].iter().all(|v| v.ancestor.as_str() == "v1"));
            assert!(order[1..].iter().all(|v| v.position == Position::Leaf));
        }
        other => panic!("Expected Output::Ordered, got {:?}", other),
    }
    assert_eq!(ordered_ids(&executor, "f1").len(), 3);
}

#[test]
fn appended_versions_chain_and_move_the_default() {
    let executor = create_executor();
    executor.execute(put("f1", &[("v1", None)])).unwrap();
    executor.execute(put("f1", &[("v2", None)])).unwrap();
    executor.execute(put("f1", &[("v3", None)])).unwrap();

    assert_eq!(ordered_ids(&executor, "f1"), vec!["v1", "v2", "v3"]);
    assert_eq!(default_id(&executor, "f1"), "v3");

    match executor
        .execute(Command::VersionGet {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            resource_type: "files".into(),
            resource_id: "f1".into(),
            version_id: "v3".into(),
        })
        .unwrap()
    {
        Output::Version(view) => {
            assert!(view.is_default);
            assert_eq!(view.record.ancestor.as_str(), "v2");
        }
        other => panic!("Expected Output::Version, got {:?}", other),
    }
}

#[test]
fn sticky_default_survives_appends_until_released() {
    let executor = create_executor();
    executor.execute(put("f1", &[("v1", None)])).unwrap();
    executor
        .execute(Command::DefaultVersionSticky {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            resource_type: "files".into(),
            resource_id: "f1".into(),
            sticky: true,
            version_id: None,
        })
        .unwrap();
    executor.execute(put("f1", &[("v2", None)])).unwrap();
    assert_eq!(default_id(&executor, "f1"), "v1");

    match executor
        .execute(Command::DefaultVersionSticky {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            resource_type: "files".into(),
            resource_id: "f1".into(),
            sticky: false,
            version_id: None,
        })
        .unwrap()
    {
        Output::Meta(meta) => {
            assert!(!meta.record.default_version_sticky);
            assert_eq!(meta.record.default_version_id.as_str(), "v2");
        }
        other => panic!("Expected Output::Meta, got {:?}", other),
    }
}

#[test]
fn deleting_a_middle_version_re_roots_its_child() {
    let executor = create_executor();
    executor
        .execute(put("f1", &[("v1", None), ("v2", Some("v1")), ("v3", Some("v2"))]))
        .unwrap();

    let out = executor
        .execute(Command::VersionsDelete {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            resource_type: "files".into(),
            resource_id: "f1".into(),
            version_ids: vec!["v2".into()],
            set_default_version_id: None,
        })
        .unwrap();
    assert!(matches!(out, Output::MaybeResource(Some(ref r)) if r.versions_count == 2));

    match executor.execute(ordered_cmd("f1")).unwrap() {
        Output::Ordered(order) => {
            let v3 = order.iter().find(|v| v.id.as_str() == "v3").unwrap();
            assert_eq!(v3.ancestor.as_str(), "v3");
            assert_eq!(v3.position, Position::Root);
        }
        other => panic!("Expected Output::Ordered, got {:?}", other),
    }
}

#[test]
fn lowered_retention_cap_prunes_through_model_update() {
    let executor = create_executor();
    for id in ["v1", "v2", "v3", "v4"] {
        executor.execute(put("f1", &[(id, None)])).unwrap();
    }

    let mut model = match executor.execute(Command::ModelGet).unwrap() {
        Output::Model(model) => model,
        other => panic!("Expected Output::Model, got {:?}", other),
    };
    if let Some(files) = model
        .groups
        .get_mut("dirs")
        .and_then(|g| g.resources.get_mut("files"))
    {
        files.max_versions = 2;
    }
    executor
        .execute(Command::ModelUpdate { model })
        .unwrap();

    assert_eq!(ordered_ids(&executor, "f1"), vec!["v3", "v4"]);

    match executor.execute(put("f1", &[("v5", None)])).unwrap() {
        Output::VersionsWritten(written) => {
            assert_eq!(written.pruned.len(), 1);
            assert_eq!(written.pruned[0].as_str(), "v3");
        }
        other => panic!("Expected Output::VersionsWritten, got {:?}", other),
    }
    assert_eq!(ordered_ids(&executor, "f1"), vec!["v4", "v5"]);
}

#[test]
fn execute_many_applies_commands_in_order() {
    let executor = create_executor();
    let results = executor.execute_many(vec![
        put("f1", &[("a", None)]),
        put("f2", &[("b", None)]),
        Command::GroupGet {
            group_type: "dirs".into(),
            group_id: "d1".into(),
        },
    ]);
    assert!(results[..2].iter().all(|r| r.is_ok()));
    match &results[2] {
        Ok(Output::Group(view)) => assert_eq!(view.resource_counts["files"], 2),
        other => panic!("Expected Output::Group, got {:?}", other),
    }
}
