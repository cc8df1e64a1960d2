//! The `Entity` capability shared by every persisted resource
//!
//! The coordinator, the adapters and the list service are generic over this
//! trait, so a new resource type only has to describe its fields,
//! validation rules, derived tags and extra facet attributes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::projection::{IndexName, IndexObject, OBJECT_ID};

/// Kind of persisted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Org,
    Match,
    Meeting,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Org,
        EntityKind::Match,
        EntityKind::Meeting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Org => "org",
            EntityKind::Match => "match",
            EntityKind::Meeting => "meeting",
        }
    }

    /// Record store table holding this kind
    pub fn table(&self) -> &'static str {
        self.index().as_str()
    }

    /// Search index holding the projection of this kind
    pub fn index(&self) -> IndexName {
        match self {
            EntityKind::User => IndexName::Users,
            EntityKind::Org => IndexName::Orgs,
            EntityKind::Match => IndexName::Matches,
            EntityKind::Meeting => IndexName::Meetings,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts both the singular kind (`match`) and the table name (`matches`)
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.table() == s)
            .ok_or_else(|| format!("unknown entity kind: {}", s))
    }
}

/// Capability implemented by `User`, `Org`, `Match` and `Meeting`
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn created(&self) -> DateTime<Utc>;

    fn updated(&self) -> DateTime<Utc>;

    /// Overwrite both timestamps; only record stores call this.
    fn stamp(&mut self, created: DateTime<Utc>, updated: DateTime<Utc>);

    /// Short human label without the id (e.g. `User Ada Lovelace`)
    fn label(&self) -> String;

    /// Semantic checks that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidField` naming the first offending field.
    fn validate(&self) -> std::result::Result<(), ValidationError>;

    /// Re-derive the `tags` field from the rest of the entity.
    fn recompute_tags(&mut self) {}

    /// Add derived facet attributes to the projection.
    fn project(&self, _object: &mut IndexObject) {}

    /// Parse and validate a raw document.
    ///
    /// # Errors
    ///
    /// `Malformed` for unknown fields or wrong types, `InvalidField` for
    /// semantic violations.
    fn parse(raw: Value) -> std::result::Result<Self, ValidationError> {
        let entity: Self =
            serde_json::from_value(raw).map_err(|e| ValidationError::Malformed {
                kind: Self::KIND,
                reason: e.to_string(),
            })?;
        entity.validate()?;
        Ok(entity)
    }

    /// Build the flattened search index projection.
    fn to_index_object(&self) -> IndexObject {
        // Derived `Serialize` on a struct with named fields always yields an object.
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        map.remove("id");
        map.insert(OBJECT_ID.to_string(), Value::String(self.id().to_string()));
        let mut object = IndexObject::from(map);
        self.project(&mut object);
        object
    }

    /// Map an index hit back to a validated entity.
    ///
    /// # Errors
    ///
    /// Same as [`Entity::parse`]; stale projections typically fail here.
    fn from_index_object(object: &IndexObject) -> std::result::Result<Self, ValidationError> {
        Self::parse(Value::Object(object.record_fields()))
    }

    /// Stable identifier for messages; not an equality key.
    fn describe(&self) -> String {
        if self.id().is_empty() {
            format!("{} (unsaved)", self.label())
        } else {
            format!("{} ({})", self.label(), self.id())
        }
    }
}
