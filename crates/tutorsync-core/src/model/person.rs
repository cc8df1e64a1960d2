use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::errors::ValidationError;

/// Role a person plays within a match or meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tutor,
    Tutee,
    Mentor,
    Mentee,
    Parent,
}

/// Reference to a user taking part in a match or meeting
///
/// Only `id` is authoritative; `name` is a display copy. Raw documents may
/// give a bare user id string instead of the full object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PersonRepr")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub roles: Vec<Role>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PersonRepr {
    Id(String),
    Full(PersonFields),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PersonFields {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    roles: Vec<Role>,
}

impl From<PersonRepr> for Person {
    fn from(repr: PersonRepr) -> Self {
        match repr {
            PersonRepr::Id(id) => Person::new(id),
            PersonRepr::Full(fields) => Person {
                id: fields.id,
                name: fields.name,
                roles: fields.roles,
            },
        }
    }
}

impl Person {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            roles: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }
}

/// Ids of the given people, in order
pub fn ids(people: &[Person]) -> Vec<String> {
    people.iter().map(|p| p.id.clone()).collect()
}

/// Non-empty, unique person ids
///
/// # Errors
///
/// Returns `InvalidField` on `field` for an empty or repeated id.
pub fn validate_people(
    kind: EntityKind,
    field: &str,
    people: &[Person],
) -> std::result::Result<(), ValidationError> {
    super::checks::id_list(kind, field, &ids(people))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_from_bare_id() {
        let people: Vec<Person> = serde_json::from_value(json!(["u1", "u2"])).unwrap();
        assert_eq!(people, vec![Person::new("u1"), Person::new("u2")]);
    }

    #[test]
    fn test_person_from_object() {
        let person: Person =
            serde_json::from_value(json!({"id": "u1", "name": "Ada", "roles": ["tutor"]}))
                .unwrap();
        assert_eq!(person.name, "Ada");
        assert!(person.has_any_role(&[Role::Tutor, Role::Tutee]));
    }

    #[test]
    fn test_person_rejects_unknown_field() {
        let result: std::result::Result<Person, _> =
            serde_json::from_value(json!({"id": "u1", "email": "ada@example.org"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_person_serializes_as_object() {
        let value = serde_json::to_value(Person::new("u1")).unwrap();
        assert_eq!(value, json!({"id": "u1", "name": "", "roles": []}));
    }
}
