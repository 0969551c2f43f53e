//! Integration tests for the storage layer
//!
//! These tests drive RegistryStore and the snapshot functions together:
//! - Concurrent readers while writesets are applied
//! - Bump mutations from concurrent writers to the same group
//! - Snapshot save and load of a populated store

use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;

use xreg_core::{
    Attributes, Epoch, GroupId, GroupKey, GroupRecord, MetaRecord, RegistryModel, RegistryRecord,
    ResourceId, ResourceRecord, Stamps, Timestamp, VersionId, VersionRecord,
};
use xreg_storage::{
    load_snapshot, save_snapshot, snapshot_path, Mutation, RegistryStore, StoreSnapshot, Writeset,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn at(secs: u64) -> Timestamp {
    Timestamp::from_secs(secs)
}

fn registry() -> RegistryRecord {
    RegistryRecord {
        id: "reg".into(),
        stamps: Stamps::created(at(1)),
    }
}

fn group_key(id: &str) -> GroupKey {
    GroupKey::new("dirs", GroupId::new_unchecked(id))
}

fn group(id: &str) -> GroupRecord {
    GroupRecord {
        key: group_key(id),
        stamps: Stamps::created(at(1)),
        attributes: Attributes::new(),
    }
}

/// Resource with a chain of `count` versions named 1..=count
fn resource(group: &str, id: &str, count: usize) -> ResourceRecord {
    let key = group_key(group).resource("files", ResourceId::new_unchecked(id));
    let mut versions = BTreeMap::new();
    for n in 1..=count {
        let vid = VersionId::new_unchecked(n.to_string());
        let ancestor = VersionId::new_unchecked(n.saturating_sub(1).max(1).to_string());
        versions.insert(
            vid.clone(),
            VersionRecord {
                id: vid,
                ancestor,
                stamps: Stamps::created(at(n as u64)),
                attributes: Attributes::new(),
            },
        );
    }
    ResourceRecord {
        key,
        meta: MetaRecord {
            default_version_id: VersionId::new_unchecked(count.to_string()),
            default_version_sticky: false,
            stamps: Stamps::created(at(1)),
        },
        versions,
    }
}

fn populated_store() -> RegistryStore {
    let store = RegistryStore::new(registry());
    let mut ws = Writeset::new();
    ws.push(Mutation::PutGroup(group("d1")));
    ws.push(Mutation::PutGroup(group("d2")));
    ws.push(Mutation::PutResource(resource("d1", "f1", 3)));
    ws.push(Mutation::PutResource(resource("d1", "f2", 1)));
    ws.push(Mutation::PutResource(resource("d2", "f1", 2)));
    ws.push(Mutation::BumpRegistry { at: at(2) });
    store.apply(ws);
    store
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_readers_never_see_half_a_writeset() {
    let store = Arc::new(RegistryStore::new(registry()));
    let mut ws = Writeset::new();
    ws.push(Mutation::PutGroup(group("d1")));
    store.apply(ws);

    let barrier = Arc::new(Barrier::new(5));
    let writer = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 0..200 {
                // Resource and group bump land together or not at all
                let mut ws = Writeset::new();
                ws.push(Mutation::PutResource(resource("d1", &format!("f{}", i), 1)));
                ws.push(Mutation::BumpGroup {
                    key: group_key("d1"),
                    at: at(2),
                });
                store.apply(ws);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    let (state, _) = store.capture();
                    let resources = state.resources.len() as u64;
                    let epoch = state.groups[&group_key("d1")].stamps.epoch;
                    assert_eq!(epoch, Epoch::new(resources + 1));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.current_version(), 201);
    assert_eq!(store.resource_counts(&group_key("d1"))["files"], 200);
}

#[test]
fn test_concurrent_group_bumps_all_land() {
    let store = Arc::new(RegistryStore::new(registry()));
    let mut ws = Writeset::new();
    ws.push(Mutation::PutGroup(group("d1")));
    store.apply(ws);

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..25 {
                    let mut ws = Writeset::new();
                    ws.push(Mutation::PutResource(resource("d1", &format!("t{}-{}", t, i), 1)));
                    ws.push(Mutation::BumpGroup {
                        key: group_key("d1"),
                        at: at(3),
                    });
                    store.apply(ws);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let g = store.group(&group_key("d1")).unwrap();
    assert_eq!(g.stamps.epoch, Epoch::new(1 + 8 * 25));
    assert_eq!(g.stamps.modified_at, at(3));
    assert_eq!(store.resource_keys_in_group(&group_key("d1")).len(), 200);
}

#[test]
fn test_failed_check_applies_nothing() {
    let store = populated_store();
    let before = store.capture();

    let mut ws = Writeset::new();
    ws.push(Mutation::DeleteGroup(group_key("d1")));
    let result = store.apply_checked(ws, |state| {
        if state.groups.contains_key(&group_key("d1")) {
            Err("group still referenced")
        } else {
            Ok(())
        }
    });

    assert_eq!(result, Err("group still referenced"));
    assert_eq!(store.capture(), before);
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_snapshot_restores_populated_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store();
    let (state, version) = store.capture();
    let model = RegistryModel::default_model();

    let path = save_snapshot(dir.path(), &StoreSnapshot::capture(state.clone(), version, model.clone()))
        .unwrap();
    assert_eq!(path, snapshot_path(dir.path()));

    let (restored, restored_version, restored_model) =
        load_snapshot(dir.path()).unwrap().unwrap().into_state();
    assert_eq!(restored, state);
    assert_eq!(restored_version, version);
    assert_eq!(restored_model, model);

    let reopened = RegistryStore::from_state(restored, restored_version);
    assert_eq!(reopened.group_counts()["dirs"], 2);
    assert_eq!(reopened.resource_keys_of_type("dirs", "files").len(), 3);
    let f1 = group_key("d1").resource("files", ResourceId::new_unchecked("f1"));
    assert_eq!(reopened.resource(&f1).unwrap().versions.len(), 3);
}

#[test]
fn test_later_snapshot_replaces_earlier() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store();
    let model = RegistryModel::default_model();

    let (state, version) = store.capture();
    save_snapshot(dir.path(), &StoreSnapshot::capture(state, version, model.clone())).unwrap();

    let mut ws = Writeset::new();
    ws.push(Mutation::DeleteGroup(group_key("d2")));
    store.apply(ws);
    let (state, version) = store.capture();
    save_snapshot(dir.path(), &StoreSnapshot::capture(state, version, model)).unwrap();

    let snapshot = load_snapshot(dir.path()).unwrap().unwrap();
    assert_eq!(snapshot.commit_version, 2);
    assert_eq!(snapshot.groups.len(), 1);
    assert_eq!(snapshot.resources.len(), 2);
}
