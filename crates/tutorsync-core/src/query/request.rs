use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::Filter;
use crate::projection::{IndexObject, OBJECT_ID};

pub const DEFAULT_HITS_PER_PAGE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub attribute: String,
    pub descending: bool,
}

impl Sort {
    pub fn ascending(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            descending: false,
        }
    }
}

/// Backend-neutral search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query; every whitespace-separated token must match
    pub query: String,
    pub filter: Filter,
    /// Zero-based page number
    pub page: usize,
    pub hits_per_page: usize,
    /// `None` orders hits by object id
    pub sort: Option<Sort>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            filter: Filter::default(),
            page: 0,
            hits_per_page: DEFAULT_HITS_PER_PAGE,
            sort: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matches before pagination
    pub nb_hits: usize,
    pub hits: Vec<IndexObject>,
}

/// Evaluate `request` over an in-process set of objects
///
/// Shared by the adapters that have no query engine of their own and by
/// the list service's store fallback, so every path filters, ranks and
/// paginates identically.
pub fn execute<'a, I>(objects: I, request: &SearchRequest) -> SearchResponse
where
    I: IntoIterator<Item = &'a IndexObject>,
{
    let tokens: Vec<String> = request
        .query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut matched: Vec<&IndexObject> = objects
        .into_iter()
        .filter(|o| request.filter.matches(o))
        .filter(|o| tokens.iter().all(|t| contains_token(o, t)))
        .collect();

    matched.sort_by(|a, b| {
        let primary = match &request.sort {
            Some(sort) => {
                let ord = compare_attr(a.get(&sort.attribute), b.get(&sort.attribute));
                if sort.descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            None => Ordering::Equal,
        };
        primary.then_with(|| a.object_id().cmp(&b.object_id()))
    });

    let nb_hits = matched.len();
    let hits = matched
        .into_iter()
        .skip(request.page.saturating_mul(request.hits_per_page))
        .take(request.hits_per_page)
        .cloned()
        .collect();

    SearchResponse { nb_hits, hits }
}

fn contains_token(object: &IndexObject, token: &str) -> bool {
    object
        .as_map()
        .iter()
        .filter(|(key, _)| key.as_str() != OBJECT_ID)
        .any(|(_, value)| value_contains(value, token))
}

fn value_contains(value: &Value, token: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(token),
        Value::Array(items) => items.iter().any(|v| value_contains(v, token)),
        Value::Object(map) => map.values().any(|v| value_contains(v, token)),
        _ => false,
    }
}

/// Numbers before strings, missing values last
fn compare_attr(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
