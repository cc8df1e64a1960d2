use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::checks;
use super::person::{self, Person};
use super::tags::{self, MeetingTag};
use super::timeslot::Timeslot;
use crate::entity::{Entity, EntityKind};
use crate::errors::ValidationError;
use crate::projection::IndexObject;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Created,
    Pending,
    Logged,
    Approved,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Venue {
    pub url: String,
}

/// A scheduled (possibly recurring) session between the people of a match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub org: String,
    #[serde(rename = "match")]
    pub match_id: String,
    pub status: MeetingStatus,
    pub creator: Option<Person>,
    pub subjects: Vec<String>,
    pub people: Vec<Person>,
    pub time: Timeslot,
    pub venue: Venue,
    pub description: String,
    /// Id of the recurring meeting this one was split off from
    pub parent_id: Option<String>,
    pub tags: Vec<MeetingTag>,
}

impl Meeting {
    pub fn new(match_id: impl Into<String>, time: Timeslot) -> Self {
        Self {
            match_id: match_id.into(),
            time,
            ..Self::default()
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.time.is_recurring()
    }
}

impl Entity for Meeting {
    const KIND: EntityKind = EntityKind::Meeting;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    fn stamp(&mut self, created: DateTime<Utc>, updated: DateTime<Utc>) {
        self.created = created;
        self.updated = updated;
    }

    fn label(&self) -> String {
        "Meeting".to_string()
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let kind = Self::KIND;
        checks::non_empty(kind, "match", &self.match_id)?;
        person::validate_people(kind, "people", &self.people)?;
        if let Some(creator) = &self.creator {
            checks::non_empty(kind, "creator.id", &creator.id)?;
        }
        if let Some(parent) = &self.parent_id {
            checks::non_empty(kind, "parentId", parent)?;
        }
        checks::labels(kind, "subjects", &self.subjects)?;
        checks::url(kind, "venue.url", &self.venue.url)?;
        self.time.validate(kind, "time")
    }

    fn recompute_tags(&mut self) {
        self.tags = tags::derive(&[(MeetingTag::Recurring, self.time.is_recurring())]);
    }

    fn project(&self, object: &mut IndexObject) {
        let ids = person::ids(&self.people)
            .into_iter()
            .map(Value::String)
            .collect();
        object.insert("_peopleIds", Value::Array(ids));
        object.insert("_timeFrom", Value::from(self.time.from.timestamp_millis()));
        object.insert("_timeTo", Value::from(self.time.to.timestamp_millis()));
        // Open-ended series sort after every bounded one in window filters.
        let last = self
            .time
            .series_end()
            .map(|end| end.timestamp_millis())
            .unwrap_or(i64::MAX);
        object.insert("_timeLast", Value::from(last));
    }
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn slot() -> Timeslot {
        Timeslot::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 17, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_parse_meeting() {
        let meeting = Meeting::parse(json!({
            "match": "m1",
            "people": ["u1", "u2"],
            "time": {"from": "2026-03-02T16:00:00Z", "to": "2026-03-02T17:00:00Z"},
            "venue": {"url": "https://meet.example.org/abc"},
            "status": "pending"
        }))
        .unwrap();
        assert_eq!(meeting.match_id, "m1");
        assert_eq!(meeting.status, MeetingStatus::Pending);
    }

    #[test]
    fn test_parse_rejects_inverted_time() {
        let err = Meeting::parse(json!({
            "match": "m1",
            "time": {"from": "2026-03-02T17:00:00Z", "to": "2026-03-02T16:00:00Z"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`time`"));
    }

    #[test]
    fn test_parse_requires_match() {
        let err = Meeting::parse(json!({
            "time": {"from": "2026-03-02T16:00:00Z", "to": "2026-03-02T17:00:00Z"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`match`"));
    }

    #[test]
    fn test_recurring_tag() {
        let mut meeting = Meeting::new("m1", slot().recurring("RRULE:FREQ=WEEKLY"));
        meeting.recompute_tags();
        assert_eq!(meeting.tags, vec![MeetingTag::Recurring]);

        meeting.time.recur = None;
        meeting.recompute_tags();
        assert!(meeting.tags.is_empty());
    }

    #[test]
    fn test_projection_time_facets() {
        let mut meeting = Meeting::new("m1", slot().recurring("RRULE:FREQ=WEEKLY"));
        meeting.id = "mt1".to_string();
        let object = meeting.to_index_object();
        assert_eq!(
            object.get("_timeFrom"),
            Some(&json!(slot().from.timestamp_millis()))
        );
        assert_eq!(object.get("_timeLast"), Some(&json!(i64::MAX)));
        assert_eq!(object.get("match"), Some(&json!("m1")));
        assert_eq!(Meeting::from_index_object(&object).unwrap(), meeting);
    }
}
