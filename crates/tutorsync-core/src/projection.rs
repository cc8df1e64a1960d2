//! Search index projection types
//!
//! An [`IndexObject`] is the flattened, JSON-shaped representation of an
//! entity that lives in a search index. It carries every record field, the
//! `objectID` join key, and derived `_`-prefixed facet attributes that exist
//! only for filtering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the entity id inside an index object
pub const OBJECT_ID: &str = "objectID";

/// Prefix marking projection-only attributes
pub const DERIVED_PREFIX: char = '_';

/// Name of a search index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexName {
    Users,
    Orgs,
    Matches,
    Meetings,
}

impl IndexName {
    pub const ALL: [IndexName; 4] = [
        IndexName::Users,
        IndexName::Orgs,
        IndexName::Matches,
        IndexName::Meetings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::Users => "users",
            IndexName::Orgs => "orgs",
            IndexName::Matches => "matches",
            IndexName::Meetings => "meetings",
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        IndexName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown index name: {}", s))
    }
}

/// Flattened projection of an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexObject(Map<String, Value>);

impl IndexObject {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The `objectID` join key, if present and a string
    pub fn object_id(&self) -> Option<&str> {
        self.0.get(OBJECT_ID).and_then(Value::as_str)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(attribute.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Record-shaped fields: `objectID` renamed back to `id` and every
    /// projection-only attribute dropped.
    pub fn record_fields(&self) -> Map<String, Value> {
        let mut record = Map::new();
        for (key, value) in &self.0 {
            if key == OBJECT_ID {
                record.insert("id".to_string(), value.clone());
            } else if !key.starts_with(DERIVED_PREFIX) {
                record.insert(key.clone(), value.clone());
            }
        }
        record
    }
}

impl From<Map<String, Value>> for IndexObject {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
