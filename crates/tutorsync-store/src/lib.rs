//! tutorsync store - SQLite adapters for the record store and search index
//!
//! Provides:
//! - Connection management and embedded, checksummed migrations
//! - `SqliteRecordStore<E>`: one table per entity kind
//! - `SqliteSearchIndex`: projections in a `search_objects` table

pub mod db;
pub mod errors;
pub mod index;
pub mod migrations;
pub mod repo;

pub use db::SharedConnection;
pub use errors::Result;
pub use index::SqliteSearchIndex;
pub use repo::SqliteRecordStore;
