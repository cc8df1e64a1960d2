use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::checks;
use super::tags::{self, UserTag};
use super::timeslot::Timeslot;
use crate::entity::{Entity, EntityKind};
use crate::errors::ValidationError;
use crate::projection::IndexObject;

/// Subjects a user can teach (`subjects`) or wants to learn (`searches`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Subjects {
    pub subjects: Vec<String>,
    pub searches: Vec<String>,
}

impl Subjects {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.searches.is_empty()
    }
}

/// Background check or vetting note recorded by an org admin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Verification {
    /// User id of the admin who recorded it
    pub creator: String,
    pub org: String,
    pub note: String,
    pub checks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub photo: String,
    pub bio: String,
    pub orgs: Vec<String>,
    pub langs: Vec<String>,
    pub tutoring: Subjects,
    pub mentoring: Subjects,
    pub parents: Vec<String>,
    pub verifications: Vec<Verification>,
    pub availability: Vec<Timeslot>,
    pub visible: bool,
    pub tags: Vec<UserTag>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: String::new(),
            created: DateTime::<Utc>::default(),
            updated: DateTime::<Utc>::default(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            photo: String::new(),
            bio: String::new(),
            orgs: Vec::new(),
            langs: vec!["en".to_string()],
            tutoring: Subjects::default(),
            mentoring: Subjects::default(),
            parents: Vec::new(),
            verifications: Vec::new(),
            availability: Vec::new(),
            visible: false,
            tags: Vec::new(),
        }
    }
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_tag(&self, tag: UserTag) -> bool {
        self.tags.contains(&tag)
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

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
        format!("User {}", self.name)
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let kind = Self::KIND;
        checks::non_empty(kind, "name", &self.name)?;
        checks::email(kind, "email", &self.email)?;
        checks::url(kind, "photo", &self.photo)?;
        checks::id_list(kind, "orgs", &self.orgs)?;
        checks::id_list(kind, "parents", &self.parents)?;
        checks::labels(kind, "langs", &self.langs)?;
        checks::labels(kind, "tutoring.subjects", &self.tutoring.subjects)?;
        checks::labels(kind, "tutoring.searches", &self.tutoring.searches)?;
        checks::labels(kind, "mentoring.subjects", &self.mentoring.subjects)?;
        checks::labels(kind, "mentoring.searches", &self.mentoring.searches)?;
        if self.parents.iter().any(|p| *p == self.id && !self.id.is_empty()) {
            return Err(ValidationError::field(
                kind,
                "parents",
                "a user cannot be their own parent",
            ));
        }
        for (i, v) in self.verifications.iter().enumerate() {
            checks::non_empty(kind, &format!("verifications[{}].creator", i), &v.creator)?;
        }
        for (i, slot) in self.availability.iter().enumerate() {
            slot.validate(kind, &format!("availability[{}]", i))?;
        }
        Ok(())
    }

    fn recompute_tags(&mut self) {
        self.tags = tags::derive(&[
            (UserTag::Tutor, !self.tutoring.subjects.is_empty()),
            (UserTag::Tutee, !self.tutoring.searches.is_empty()),
            (UserTag::Mentor, !self.mentoring.subjects.is_empty()),
            (UserTag::Mentee, !self.mentoring.searches.is_empty()),
            (UserTag::Vetted, !self.verifications.is_empty()),
        ]);
    }

    fn project(&self, object: &mut IndexObject) {
        object.insert("_tutoringSubjects", strings(&self.tutoring.subjects));
        object.insert("_mentoringSubjects", strings(&self.mentoring.subjects));
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_user() {
        let user = User::parse(json!({"name": "Ada Lovelace"})).unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.langs, vec!["en".to_string()]);
        assert!(user.id.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_field() {
        let err = User::parse(json!({"name": "Ada", "nickname": "A"})).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rejects_blank_name() {
        let err = User::parse(json!({"name": "   "})).unwrap_err();
        assert!(err.to_string().contains("`name`"));
    }

    #[test]
    fn test_recompute_tags() {
        let mut user = User::new("Ada");
        user.tutoring.subjects = vec!["Algebra".to_string()];
        user.mentoring.searches = vec!["Career".to_string()];
        user.verifications.push(Verification {
            creator: "admin".to_string(),
            ..Verification::default()
        });
        user.tags = vec![UserTag::Tutee];
        user.recompute_tags();
        assert_eq!(
            user.tags,
            vec![UserTag::Tutor, UserTag::Mentee, UserTag::Vetted]
        );
    }

    #[test]
    fn test_projection_has_facets() {
        let mut user = User::new("Ada");
        user.id = "u1".to_string();
        user.tutoring.subjects = vec!["Algebra".to_string()];
        let object = user.to_index_object();
        assert_eq!(object.object_id(), Some("u1"));
        assert_eq!(object.get("_tutoringSubjects"), Some(&json!(["Algebra"])));
        assert_eq!(object.get("id"), None);
    }

    #[test]
    fn test_describe() {
        let mut user = User::new("Ada Lovelace");
        assert_eq!(user.describe(), "User Ada Lovelace (unsaved)");
        user.id = "u1".to_string();
        assert_eq!(user.to_string(), "User Ada Lovelace (u1)");
    }
}
