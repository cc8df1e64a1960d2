use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tutorsync_core::model::{Match, Meeting, Person, Role, Timeslot};
use tutorsync_core::IndexObject;

#[allow(dead_code)]
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

/// Match between a tutor and a tutee in org `o1`
#[allow(dead_code)]
pub fn tutoring_match(id: &str, subjects: &[&str]) -> Match {
    let mut m = Match::new([
        Person::new("u1").with_roles([Role::Tutor]),
        Person::new("u2").with_roles([Role::Tutee]),
    ]);
    m.id = id.to_string();
    m.org = "o1".to_string();
    m.subjects = subjects.iter().map(|s| s.to_string()).collect();
    m
}

#[allow(dead_code)]
pub fn weekly_meeting(id: &str, match_id: &str, day: u32) -> Meeting {
    let mut meeting = Meeting::new(
        match_id,
        Timeslot::new(at(day, 16), at(day, 17)).recurring("RRULE:FREQ=WEEKLY"),
    );
    meeting.id = id.to_string();
    meeting.org = "o1".to_string();
    meeting
}

#[allow(dead_code)]
pub fn object(value: Value) -> IndexObject {
    match value {
        Value::Object(map) => IndexObject::from(map),
        other => panic!("expected a JSON object, got {}", other),
    }
}

#[allow(dead_code)]
pub fn raw_match(id: &str) -> Value {
    json!({
        "id": id,
        "org": "o1",
        "people": ["u1", "u2"],
        "subjects": ["math"]
    })
}
