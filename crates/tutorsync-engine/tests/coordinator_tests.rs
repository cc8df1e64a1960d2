#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{at, harness, harness_with, raw_match, raw_weekly_meeting};
use proptest::prelude::*;
use serde_json::json;
use tutorsync_core::errors::{ExError, ExErrorKind, Verb};
use tutorsync_core::logging_facility::test_capture::init_test_capture;
use tutorsync_core::model::{Match, MatchTag, Meeting, MeetingTag, Person, Role};
use tutorsync_core::{Entity, IndexName, RecordStore, SyncError};
use tutorsync_core_types::schema::{EVENT_END, EVENT_PARTIAL, EVENT_START};
use tutorsync_core_types::RequestContext;
use tutorsync_engine::{CoordinatorOptions, EngineConfig, Visibility};

#[test]
fn test_match_then_recurring_meeting_scenario() {
    let matches = harness::<Match>();
    let meetings = harness::<Meeting>();
    let ctx = RequestContext::new();

    let created = matches
        .services
        .coordinator
        .create(&ctx, json!({"id": "m1", "people": ["u1", "u2"], "subjects": ["math"]}))
        .unwrap();
    let fetched = matches.services.coordinator.fetch(&ctx, "m1").unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.subjects, vec!["math".to_string()]);

    let mut raw = raw_weekly_meeting("mt1", "m1", 2);
    raw["time"].as_object_mut().unwrap().remove("recur");
    let meeting = meetings.services.coordinator.create(&ctx, raw).unwrap();
    assert!(meeting.tags.is_empty());

    let mut raw = raw_weekly_meeting("mt1", "m1", 2);
    raw["tags"] = json!([]);
    let updated = meetings.services.coordinator.update(&ctx, raw).unwrap();
    assert_eq!(updated.tags, vec![MeetingTag::Recurring]);
    assert_eq!(updated.created, meeting.created);

    let projected = meetings.index.inner.get(IndexName::Meetings, "mt1").unwrap();
    assert_eq!(projected.get("tags"), Some(&json!(["recurring"])));
}

#[test]
fn test_update_ignores_caller_supplied_tags() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.services.coordinator.create(&ctx, raw_match("m1")).unwrap();

    let mut raw = raw_match("m1");
    raw["tags"] = json!(["mentoring"]);
    let updated = h.services.coordinator.update(&ctx, raw).unwrap();
    assert_eq!(updated.tags, vec![MatchTag::Tutoring]);
}

#[test]
fn test_delete_then_fetch_is_not_found() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.services.coordinator.create(&ctx, raw_match("m1")).unwrap();

    h.services.coordinator.delete(&ctx, "m1").unwrap();
    let err = h.services.coordinator.fetch(&ctx, "m1").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), 400);
    assert!(h.index.inner.get(IndexName::Matches, "m1").is_none());
}

#[test]
fn test_delete_missing_is_not_found() {
    let h = harness::<Match>();
    let err = h
        .services
        .coordinator
        .delete(&RequestContext::new(), "m404")
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.verb(), Verb::Delete);
}

#[test]
fn test_duplicate_create_is_conflict() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.services.coordinator.create(&ctx, raw_match("m1")).unwrap();

    let err = h.services.coordinator.create(&ctx, raw_match("m1")).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.status(), 500);
    assert_eq!(ExError::from(&err).kind(), ExErrorKind::Conflict);
    assert_eq!(h.store.list().unwrap().len(), 1);
}

#[test]
fn test_index_failure_after_create_is_partial() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.index.set_fail_writes(true);

    let err = h.services.coordinator.create(&ctx, raw_match("m1")).unwrap_err();
    assert!(err.is_partial());
    assert_eq!(err.committed_id(), Some("m1"));
    assert_eq!(err.status(), 500);
    assert!(err.to_string().contains("was created in the record store"));

    // The store is authoritative
    let fetched = h.services.coordinator.fetch(&ctx, "m1").unwrap();
    assert_eq!(fetched.tags, vec![MatchTag::Tutoring]);
    assert!(h.index.inner.get(IndexName::Matches, "m1").is_none());
}

#[test]
fn test_store_failure_never_reaches_index() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.store.set_fail_writes(true);

    let err = h.services.coordinator.create(&ctx, raw_match("m1")).unwrap_err();
    assert!(matches!(err, SyncError::Store { .. }));
    assert!(std::error::Error::source(&err).is_some());
    assert!(h.index.inner.get(IndexName::Matches, "m1").is_none());
}

#[test]
fn test_index_failure_after_update_keeps_store_change() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    let created = h.services.coordinator.create(&ctx, raw_match("m1")).unwrap();

    h.index.set_fail_writes(true);
    let mut raw = raw_match("m1");
    raw["subjects"] = json!(["Geometry"]);
    let err = h.services.coordinator.update(&ctx, raw).unwrap_err();
    assert!(err.is_partial());
    assert_eq!(err.committed_id(), Some("m1"));
    assert_eq!(err.verb(), Verb::Update);

    let fetched = h.services.coordinator.fetch(&ctx, "m1").unwrap();
    assert_eq!(fetched.subjects, vec!["Geometry".to_string()]);
    assert_eq!(fetched.created, created.created);
    assert!(fetched.updated >= created.updated);

    // The index still serves the previous projection until a sweep
    let projected = h.index.inner.get(IndexName::Matches, "m1").unwrap();
    assert_eq!(projected.get("subjects"), Some(&json!(["Algebra"])));
}

#[test]
fn test_store_failure_on_update_leaves_index_untouched() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.services.coordinator.create(&ctx, raw_match("m1")).unwrap();

    h.store.set_fail_writes(true);
    let mut raw = raw_match("m1");
    raw["subjects"] = json!(["Geometry"]);
    let err = h.services.coordinator.update(&ctx, raw).unwrap_err();
    assert!(matches!(err, SyncError::Store { .. }));
    assert!(!err.is_partial());

    let projected = h.index.inner.get(IndexName::Matches, "m1").unwrap();
    assert_eq!(projected.get("subjects"), Some(&json!(["Algebra"])));
    let fetched = h.services.coordinator.fetch(&ctx, "m1").unwrap();
    assert_eq!(fetched.subjects, vec!["Algebra".to_string()]);
}

#[test]
fn test_store_failure_on_delete_leaves_index_untouched() {
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.services.coordinator.create(&ctx, raw_match("m1")).unwrap();

    h.store.set_fail_writes(true);
    let err = h.services.coordinator.delete(&ctx, "m1").unwrap_err();
    assert!(matches!(err, SyncError::Store { .. }));
    assert_eq!(err.verb(), Verb::Delete);

    assert!(h.index.inner.get(IndexName::Matches, "m1").is_some());
    assert!(h.store.fetch("m1").is_ok());
}

#[test]
fn test_validation_failure_never_reaches_store() {
    let h = harness::<Match>();
    h.store.set_fail_writes(true);

    let err = h
        .services
        .coordinator
        .create(&RequestContext::new(), json!({"people": []}))
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation { .. }));
    assert_eq!(err.status(), 400);
}

#[test]
fn test_create_assigns_id_when_absent() {
    let h = harness::<Match>();
    let mut raw = raw_match("");
    raw.as_object_mut().unwrap().remove("id");

    let created = h
        .services
        .coordinator
        .create(&RequestContext::new(), raw)
        .unwrap();
    assert!(!created.id.is_empty());
    assert!(h.index.inner.get(IndexName::Matches, &created.id).is_some());
}

#[test]
fn test_visible_create_waits_for_index() {
    let config = EngineConfig {
        visibility: CoordinatorOptions {
            create: Visibility::Visible,
            ..CoordinatorOptions::default()
        },
        ..EngineConfig::default()
    };
    let h = harness_with::<Meeting>(&config);
    let created = h
        .services
        .coordinator
        .create(&RequestContext::new(), raw_weekly_meeting("mt1", "m1", 9))
        .unwrap();
    assert_eq!(created.time.from, at(9, 16));
    assert_eq!(h.index.inner.pending_len(), 0);
}

#[test]
fn test_partial_create_logs_warning() {
    let capture = init_test_capture();
    let h = harness::<Match>();
    h.index.set_fail_writes(true);

    let ctx = RequestContext::new();
    let _ = h.services.coordinator.create(&ctx, raw_match("m-logged-1"));

    let events = capture.events();
    let partial = events
        .iter()
        .find(|e| {
            e.op.as_deref() == Some("create")
                && e.event.as_deref() == Some(EVENT_PARTIAL)
                && e.field("error").is_some_and(|m| m.contains("m-logged-1"))
        })
        .expect("partial event");
    assert_eq!(partial.field("err.code"), Some("ERR_INDEX"));
    assert_eq!(partial.level, tracing::Level::WARN);
}

#[test]
fn test_successful_fetch_logs_start_and_end() {
    let capture = init_test_capture();
    let h = harness::<Match>();
    let ctx = RequestContext::new();
    h.services.coordinator.create(&ctx, raw_match("m-logged-2")).unwrap();
    h.services.coordinator.fetch(&ctx, "m-logged-2").unwrap();

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some("fetch")
            && e.event.as_deref() == Some(EVENT_START)
            && e.field("entity_id") == Some("m-logged-2")
    });
    assert_eq!(starts, 1);
    capture.assert_event_exists("fetch", EVENT_END);
}

fn arb_match() -> impl Strategy<Value = Match> {
    let people = prop::collection::btree_set("u[0-9]{1,3}", 1..4);
    let subjects = prop::collection::vec("[A-Za-z]{1,12}", 0..4);
    let roles = prop::sample::select(vec![Role::Tutor, Role::Tutee, Role::Mentor, Role::Parent]);
    ("m[a-z0-9]{1,10}", people, subjects, roles, "[a-z ]{0,30}").prop_map(
        |(id, people, subjects, role, message)| {
            let mut m = Match::new(
                people
                    .into_iter()
                    .map(|id| Person::new(id).with_roles([role])),
            );
            m.id = id;
            m.org = "o1".to_string();
            m.subjects = subjects;
            m.message = message;
            m
        },
    )
}

proptest! {
    #[test]
    fn prop_create_then_fetch_returns_input(input in arb_match()) {
        let h = harness::<Match>();
        let ctx = RequestContext::new();

        let created = h.services.coordinator.create_entity(&ctx, input.clone()).unwrap();
        let fetched = h.services.coordinator.fetch(&ctx, &input.id).unwrap();
        prop_assert_eq!(&fetched, &created);

        let mut expected = input;
        expected.recompute_tags();
        expected.stamp(fetched.created, fetched.updated);
        prop_assert_eq!(fetched, expected);
    }
}
