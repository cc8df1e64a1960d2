//! Typed list queries, one per entity kind
//!
//! Each query knows which facet attributes its fields map to and turns
//! itself into a backend-neutral [`SearchRequest`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::{Comparison, Filter};
use super::request::{SearchRequest, Sort, DEFAULT_HITS_PER_PAGE};
use crate::entity::Entity;
use crate::model::{Match, MatchTag, Meeting, MeetingTag, Org, User, UserTag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: usize,
    /// `None` defers to the list service's configured default
    pub hits_per_page: Option<usize>,
}

/// A query that lists entities of one kind
pub trait ListQuery {
    type Entity: Entity;

    fn pagination(&self) -> Pagination;

    fn filter(&self) -> Filter;

    fn text(&self) -> &str {
        ""
    }

    fn sort(&self) -> Option<Sort> {
        None
    }

    fn to_request(&self) -> SearchRequest {
        let pagination = self.pagination();
        SearchRequest {
            query: self.text().to_string(),
            filter: self.filter(),
            page: pagination.page,
            hits_per_page: pagination.hits_per_page.unwrap_or(DEFAULT_HITS_PER_PAGE),
            sort: self.sort(),
        }
    }
}

fn tag_values<T, F>(tags: &[T], as_str: F) -> Vec<&'static str>
where
    F: Fn(&T) -> &'static str,
{
    tags.iter().map(as_str).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersQuery {
    pub query: String,
    pub orgs: Vec<String>,
    pub langs: Vec<String>,
    pub tutoring_subjects: Vec<String>,
    pub mentoring_subjects: Vec<String>,
    pub tags: Vec<UserTag>,
    pub visible: Option<bool>,
    pub pagination: Pagination,
}

impl ListQuery for UsersQuery {
    type Entity = User;

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn text(&self) -> &str {
        &self.query
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .facet("orgs", self.orgs.iter().cloned())
            .facet("langs", self.langs.iter().cloned())
            .facet("_tutoringSubjects", self.tutoring_subjects.iter().cloned())
            .facet("_mentoringSubjects", self.mentoring_subjects.iter().cloned())
            .facet("tags", tag_values(&self.tags, UserTag::as_str))
            .facet("visible", self.visible.map(|v| v.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgsQuery {
    pub query: String,
    pub members: Vec<String>,
    pub subjects: Vec<String>,
    pub pagination: Pagination,
}

impl ListQuery for OrgsQuery {
    type Entity = Org;

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn text(&self) -> &str {
        &self.query
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .facet("members", self.members.iter().cloned())
            .facet("subjects", self.subjects.iter().cloned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchesQuery {
    pub query: String,
    pub org: Option<String>,
    /// Matches containing any of these user ids
    pub people: Vec<String>,
    pub subjects: Vec<String>,
    pub tags: Vec<MatchTag>,
    pub pagination: Pagination,
}

impl ListQuery for MatchesQuery {
    type Entity = Match;

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn text(&self) -> &str {
        &self.query
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .facet("org", self.org.clone())
            .facet("_peopleIds", self.people.iter().cloned())
            .facet("subjects", self.subjects.iter().cloned())
            .facet("tags", tag_values(&self.tags, MatchTag::as_str))
    }
}

/// Half-open calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingsQuery {
    pub org: Option<String>,
    pub people: Vec<String>,
    pub subjects: Vec<String>,
    pub match_id: Option<String>,
    pub tags: Vec<MeetingTag>,
    /// Meetings (or recurring series) overlapping this window
    pub window: Option<TimeWindow>,
    pub pagination: Pagination,
}

impl ListQuery for MeetingsQuery {
    type Entity = Meeting;

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn filter(&self) -> Filter {
        let mut filter = Filter::new()
            .facet("org", self.org.clone())
            .facet("_peopleIds", self.people.iter().cloned())
            .facet("subjects", self.subjects.iter().cloned())
            .facet("match", self.match_id.clone())
            .facet("tags", tag_values(&self.tags, MeetingTag::as_str));
        if let Some(window) = self.window {
            filter = filter
                .numeric("_timeFrom", Comparison::Le, window.to.timestamp_millis())
                .numeric("_timeLast", Comparison::Ge, window.from.timestamp_millis());
        }
        filter
    }

    fn sort(&self) -> Option<Sort> {
        Some(Sort::ascending("_timeFrom"))
    }
}
