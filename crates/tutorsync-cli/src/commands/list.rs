//! Filtered listing

use chrono::{DateTime, Utc};
use clap::Args;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tutorsync_core::errors::ExError;
use tutorsync_core::query::{
    MatchesQuery, MeetingsQuery, OrgsQuery, Pagination, TimeWindow, UsersQuery,
};
use tutorsync_core::EntityKind;

use super::{invalid_input, print_json, Session};

#[derive(Debug, Args)]
pub struct ListArgs {
    pub kind: EntityKind,

    /// Org id (users: member of; matches/meetings: owned by)
    #[arg(long)]
    pub org: Option<String>,

    /// Subject facet; repeat to match any of several
    #[arg(long = "subject")]
    pub subjects: Vec<String>,

    /// User id taking part (orgs: admin)
    #[arg(long = "person")]
    pub people: Vec<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Full-text query (not supported for meetings)
    #[arg(long)]
    pub query: Option<String>,

    /// Meetings overlapping [from, to], RFC 3339
    #[arg(long, requires = "to")]
    pub from: Option<DateTime<Utc>>,

    #[arg(long, requires = "from")]
    pub to: Option<DateTime<Utc>>,

    #[arg(long, default_value_t = 0)]
    pub page: usize,

    #[arg(long)]
    pub hits_per_page: Option<usize>,
}

pub fn execute(session: &Session, args: ListArgs) -> Result<(), ExError> {
    let ctx = &session.ctx;
    let services = &session.services;
    let pagination = Pagination {
        page: args.page,
        hits_per_page: args.hits_per_page,
    };
    if args.kind != EntityKind::Meeting && args.from.is_some() {
        return Err(invalid_input("list", "--from/--to only apply to meetings"));
    }

    match args.kind {
        EntityKind::User => {
            if !args.people.is_empty() {
                return Err(invalid_input("list", "--person does not apply to users"));
            }
            let query = UsersQuery {
                query: args.query.unwrap_or_default(),
                orgs: args.org.into_iter().collect(),
                tutoring_subjects: args.subjects,
                tags: parse_tags(&args.tags)?,
                pagination,
                ..UsersQuery::default()
            };
            print_json(&services.users.list.list(ctx, &query)?)
        }
        EntityKind::Org => {
            if args.org.is_some() || !args.tags.is_empty() {
                return Err(invalid_input("list", "--org and --tag do not apply to orgs"));
            }
            let query = OrgsQuery {
                query: args.query.unwrap_or_default(),
                members: args.people,
                subjects: args.subjects,
                pagination,
            };
            print_json(&services.orgs.list.list(ctx, &query)?)
        }
        EntityKind::Match => {
            let query = MatchesQuery {
                query: args.query.unwrap_or_default(),
                org: args.org,
                people: args.people,
                subjects: args.subjects,
                tags: parse_tags(&args.tags)?,
                pagination,
            };
            print_json(&services.matches.list.list(ctx, &query)?)
        }
        EntityKind::Meeting => {
            if args.query.is_some() {
                return Err(invalid_input("list", "--query does not apply to meetings"));
            }
            let window = match (args.from, args.to) {
                (Some(from), Some(to)) => Some(TimeWindow { from, to }),
                _ => None,
            };
            let query = MeetingsQuery {
                org: args.org,
                people: args.people,
                subjects: args.subjects,
                tags: parse_tags(&args.tags)?,
                window,
                pagination,
                ..MeetingsQuery::default()
            };
            print_json(&services.meetings.list.list(ctx, &query)?)
        }
    }
}

fn parse_tags<T: DeserializeOwned>(tags: &[String]) -> Result<Vec<T>, ExError> {
    tags.iter()
        .map(|tag| {
            serde_json::from_value(Value::String(tag.clone()))
                .map_err(|_| invalid_input("list", format!("unknown tag: {}", tag)))
        })
        .collect()
}
