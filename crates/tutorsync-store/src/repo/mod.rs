//! Record store adapter over SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRecordStore;
