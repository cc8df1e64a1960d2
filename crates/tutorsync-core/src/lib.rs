//! tutorsync core - entity model and synchronization capabilities
//!
//! This crate provides:
//! - The `User`, `Org`, `Match` and `Meeting` models and the `Entity` trait
//!   that validates, tags and projects them
//! - The `RecordStore` and `SearchIndex` capability traits with in-memory
//!   adapters
//! - Facet filters, search requests and typed list queries
//! - The error taxonomy and the structured logging facility

pub mod entity;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod ports;
pub mod projection;
pub mod query;

// Re-export commonly used types
pub use entity::{Entity, EntityKind};
pub use errors::{
    ExError, ExErrorKind, IndexError, Result, StoreError, SyncError, ValidationError, Verb,
};
pub use model::{Match, Meeting, Org, User};
pub use ops::{MemoryIndex, MemoryStore};
pub use ports::{IndexTask, RecordStore, SearchIndex};
pub use projection::{IndexName, IndexObject};
pub use query::{ListQuery, SearchRequest, SearchResponse};
