//! Filters, search requests and typed list queries

pub mod filter;
pub mod lists;
pub mod request;

pub use filter::{Clause, Comparison, FacetTerm, Filter, NumericTerm};
pub use lists::{
    ListQuery, MatchesQuery, MeetingsQuery, OrgsQuery, Pagination, TimeWindow, UsersQuery,
};
pub use request::{execute, SearchRequest, SearchResponse, Sort};
