#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{sample_match, setup_disk_db};
use tutorsync_core::model::{Match, Meeting, Timeslot};
use tutorsync_core::{RecordStore, StoreError};
use tutorsync_store::db::open_shared;
use tutorsync_store::SqliteRecordStore;

#[test]
fn test_rows_survive_reopen() {
    let (_dir, path, conn) = setup_disk_db();
    let stored = {
        let store = SqliteRecordStore::<Match>::new(conn);
        store.insert(&sample_match("m1")).unwrap()
    };

    let reopened = SqliteRecordStore::<Match>::new(open_shared(&path).unwrap());
    assert_eq!(reopened.fetch("m1").unwrap(), stored);
}

#[test]
fn test_store_owns_timestamps() {
    let (_dir, _path, conn) = setup_disk_db();
    let store = SqliteRecordStore::<Match>::new(conn);

    let mut input = sample_match("m1");
    input.created = chrono::DateTime::parse_from_rfc3339("1999-01-01T00:00:00Z")
        .unwrap()
        .into();
    let stored = store.insert(&input).unwrap();
    assert_ne!(stored.created, input.created);
    assert_eq!(stored.created, stored.updated);

    let mut changed = stored.clone();
    changed.message = "Tuesdays work better".to_string();
    let updated = store.update(&changed).unwrap();
    assert_eq!(updated.created, stored.created);
    assert!(updated.updated >= stored.updated);
    assert_eq!(store.fetch("m1").unwrap(), updated);
}

#[test]
fn test_update_missing_row() {
    let (_dir, _path, conn) = setup_disk_db();
    let store = SqliteRecordStore::<Match>::new(conn);
    let err = store.update(&sample_match("ghost")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { table: "matches", .. }));
}

#[test]
fn test_tables_are_separate_per_kind() {
    let (_dir, _path, conn) = setup_disk_db();
    let matches = SqliteRecordStore::<Match>::new(conn.clone());
    let meetings = SqliteRecordStore::<Meeting>::new(conn);

    matches.insert(&sample_match("x1")).unwrap();
    assert!(meetings.fetch("x1").unwrap_err().is_not_found());

    let from = chrono::Utc::now();
    let mut meeting = Meeting::new("x1", Timeslot::new(from, from + chrono::Duration::hours(1)));
    meeting.id = "x1".to_string();
    meetings.insert(&meeting).unwrap();
    assert_eq!(meetings.list().unwrap().len(), 1);
    assert_eq!(matches.list().unwrap().len(), 1);
}

#[test]
fn test_corrupt_row_is_reported() {
    let (_dir, _path, conn) = setup_disk_db();
    let store = SqliteRecordStore::<Match>::new(conn.clone());
    store.insert(&sample_match("m1")).unwrap();

    conn.lock()
        .unwrap()
        .execute(
            "UPDATE matches SET body_json = '{\"people\": []}' WHERE id = 'm1'",
            [],
        )
        .unwrap();

    let err = store.fetch("m1").unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn test_list_is_ordered_by_id() {
    let (_dir, _path, conn) = setup_disk_db();
    let store = SqliteRecordStore::<Match>::new(conn);
    for id in ["m3", "m1", "m2"] {
        store.insert(&sample_match(id)).unwrap();
    }
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}
