//! Error Handling Tests
//!
//! Every error carries the path of the entity it concerns.

use crate::common::*;
use xreg_core::{Epoch, VersionId};
use xregistry::{Command, Error, Output, VersionProposal};

// ============================================================================
// Addressing
// ============================================================================

#[test]
fn write_into_missing_group_is_not_found() {
    let executor = create_executor();
    let err = executor
        .execute(Command::VersionsPut {
            group_type: "dirs".into(),
            group_id: "d9".into(),
            resource_type: "files".into(),
            resource_id: "f1".into(),
            versions: [("v1".to_string(), VersionProposal::new())].into_iter().collect(),
            set_default_version_id: None,
        })
        .unwrap_err();
    assert_eq!(
        err,
        Error::NotFound {
            subject: "/dirs/d9".into()
        }
    );
}

#[test]
fn duplicate_group_already_exists() {
    let executor = create_executor();
    let err = executor
        .execute(Command::GroupCreate {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            attributes: Default::default(),
        })
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));
    assert_eq!(err.subject(), Some("/dirs/d1"));
}

#[test]
fn unknown_group_type_in_list_is_bad_request() {
    let executor = create_executor();
    let err = executor
        .execute(Command::GroupList {
            group_type: "schemagroups".into(),
        })
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest { .. }), "got {:?}", err);
}

#[test]
fn malformed_ids_are_rejected() {
    let executor = create_executor();
    for bad in ["", "has space", "slash/inside"] {
        let err = executor
            .execute(Command::GroupGet {
                group_type: "dirs".into(),
                group_id: bad.into(),
            })
            .unwrap_err();
        assert!(
            matches!(err, Error::InvalidId { ref value, .. } if value == bad),
            "expected InvalidId for {:?}, got {:?}",
            bad,
            err
        );
    }
}

// ============================================================================
// Ancestry
// ============================================================================

#[test]
fn unknown_ancestor_names_the_missing_ids() {
    let executor = create_executor();
    let err = executor
        .execute(put("f1", &[("v1", Some("nope")), ("v2", Some("gone"))]))
        .unwrap_err();
    match err {
        Error::UnknownAncestor { subject, missing } => {
            assert!(subject.starts_with("/dirs/d1/files/f1"), "subject: {}", subject);
            assert_eq!(missing, vec!["gone".to_string(), "nope".to_string()]);
        }
        other => panic!("Expected UnknownAncestor, got {:?}", other),
    }
    let err = executor.execute(meta_cmd("f1")).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn cycle_through_stored_versions_is_rejected_atomically() {
    let executor = create_executor();
    executor
        .execute(put("f1", &[("v1", None), ("v2", Some("v1"))]))
        .unwrap();

    let err = executor
        .execute(put("f1", &[("v1", Some("v2")), ("v3", None)]))
        .unwrap_err();
    match err {
        Error::CircularAncestor { ids, .. } => assert_eq!(ids, vec!["v1", "v2"]),
        other => panic!("Expected CircularAncestor, got {:?}", other),
    }
    assert_eq!(ordered_ids(&executor, "f1"), vec!["v1", "v2"]);
}

#[test]
fn stale_epoch_reports_expected_and_actual() {
    let executor = create_executor();
    executor.execute(put("f1", &[("v1", None)])).unwrap();

    let update = |epoch: u64| Command::VersionsPut {
        group_type: "dirs".into(),
        group_id: "d1".into(),
        resource_type: "files".into(),
        resource_id: "f1".into(),
        versions: [(
            "v1".to_string(),
            VersionProposal::new()
                .with_epoch(Epoch::new(epoch))
                .with_attribute("name", serde_json::json!("renamed")),
        )]
        .into_iter()
        .collect(),
        set_default_version_id: None,
    };

    assert!(matches!(
        executor.execute(update(1)).unwrap(),
        Output::VersionsWritten(_)
    ));
    let err = executor.execute(update(1)).unwrap_err();
    assert_eq!(
        err,
        Error::MismatchedEpoch {
            subject: "/dirs/d1/files/f1/versions/v1".into(),
            expected: 1,
            actual: 2,
        }
    );
}

#[test]
fn pinning_an_unknown_default_is_unknown_id() {
    let executor = create_executor();
    executor.execute(put("f1", &[("v1", None)])).unwrap();
    let err = executor
        .execute(Command::DefaultVersionSticky {
            group_type: "dirs".into(),
            group_id: "d1".into(),
            resource_type: "files".into(),
            resource_id: "f1".into(),
            sticky: true,
            version_id: Some("v7".into()),
        })
        .unwrap_err();
    match err {
        Error::UnknownId { id, .. } => assert_eq!(id, VersionId::new_unchecked("v7").into_inner()),
        other => panic!("Expected UnknownId, got {:?}", other),
    }
    assert_eq!(default_id(&executor, "f1"), "v1");
}
