use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checks;
use crate::entity::{Entity, EntityKind};
use crate::errors::ValidationError;

/// A school, nonprofit or company that runs a tutoring program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Org {
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub photo: String,
    pub bio: String,
    /// User ids of the org's admins
    pub members: Vec<String>,
    pub subjects: Vec<String>,
    /// Email domains whose users join the org automatically
    pub domains: Vec<String>,
}

impl Org {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Entity for Org {
    const KIND: EntityKind = EntityKind::Org;

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
        format!("Org {}", self.name)
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let kind = Self::KIND;
        checks::non_empty(kind, "name", &self.name)?;
        checks::email(kind, "email", &self.email)?;
        checks::url(kind, "photo", &self.photo)?;
        checks::id_list(kind, "members", &self.members)?;
        checks::labels(kind, "subjects", &self.subjects)?;
        for domain in &self.domains {
            if domain.trim().is_empty() || domain.contains('@') || !domain.contains('.') {
                return Err(ValidationError::field(
                    kind,
                    "domains",
                    format!("{} is not an email domain", domain),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Org {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
