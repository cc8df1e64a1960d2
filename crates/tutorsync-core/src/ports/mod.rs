//! Capability interfaces for the two backing systems
//!
//! The coordinator and list service only see these traits; concrete
//! adapters live in `crate::ops` (in-memory) and in `tutorsync-store`
//! (SQLite).

pub mod record_store;
pub mod search_index;

pub use record_store::{now, prepare_insert, RecordStore};
pub use search_index::{IndexTask, SearchIndex};
