use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::checks;
use super::person::{self, Person, Role};
use super::tags::{self, MatchTag};
use crate::entity::{Entity, EntityKind};
use crate::errors::ValidationError;
use crate::projection::IndexObject;

/// A pairing of people (tutor/tutee, mentor/mentee) within an org
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Org id; empty for matches made outside any org
    pub org: String,
    pub subjects: Vec<String>,
    pub people: Vec<Person>,
    pub creator: Option<Person>,
    pub message: String,
    pub tags: Vec<MatchTag>,
}

impl Match {
    pub fn new(people: impl IntoIterator<Item = Person>) -> Self {
        Self {
            people: people.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn people_ids(&self) -> Vec<String> {
        person::ids(&self.people)
    }
}

impl Entity for Match {
    const KIND: EntityKind = EntityKind::Match;

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
        "Match".to_string()
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let kind = Self::KIND;
        if self.people.is_empty() {
            return Err(ValidationError::field(kind, "people", "cannot be empty"));
        }
        person::validate_people(kind, "people", &self.people)?;
        if let Some(creator) = &self.creator {
            checks::non_empty(kind, "creator.id", &creator.id)?;
        }
        checks::labels(kind, "subjects", &self.subjects)
    }

    fn recompute_tags(&mut self) {
        let any = |roles: &[Role]| self.people.iter().any(|p| p.has_any_role(roles));
        self.tags = tags::derive(&[
            (MatchTag::Tutoring, any(&[Role::Tutor, Role::Tutee])),
            (MatchTag::Mentoring, any(&[Role::Mentor, Role::Mentee])),
        ]);
    }

    fn project(&self, object: &mut IndexObject) {
        let ids = self.people_ids().into_iter().map(Value::String).collect();
        object.insert("_peopleIds", Value::Array(ids));
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_accepts_bare_person_ids() {
        let m = Match::parse(json!({
            "id": "m1",
            "people": ["u1", "u2"],
            "subjects": ["math"]
        }))
        .unwrap();
        assert_eq!(m.people_ids(), vec!["u1".to_string(), "u2".to_string()]);
        assert_eq!(m.describe(), "Match (m1)");
    }

    #[test]
    fn test_parse_rejects_empty_person_id() {
        let err = Match::parse(json!({"people": ["u1", ""]})).unwrap_err();
        assert!(err.to_string().contains("empty id"));
    }

    #[test]
    fn test_parse_rejects_duplicate_people() {
        let err = Match::parse(json!({"people": ["u1", "u1"]})).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_recompute_tags_from_roles() {
        let mut m = Match::new([
            Person::new("u1").with_roles([Role::Tutor]),
            Person::new("u2").with_roles([Role::Mentee]),
        ]);
        m.recompute_tags();
        assert_eq!(m.tags, vec![MatchTag::Tutoring, MatchTag::Mentoring]);

        m.people = vec![Person::new("u1").with_roles([Role::Parent])];
        m.recompute_tags();
        assert!(m.tags.is_empty());
    }

    #[test]
    fn test_index_object_round_trip() {
        let mut m = Match::new([Person::new("u1"), Person::new("u2")]);
        m.id = "m1".to_string();
        m.subjects = vec!["math".to_string()];
        let object = m.to_index_object();
        assert_eq!(object.get("_peopleIds"), Some(&json!(["u1", "u2"])));
        assert_eq!(Match::from_index_object(&object).unwrap(), m);
    }
}
