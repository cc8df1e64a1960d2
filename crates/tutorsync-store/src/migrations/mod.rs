//! Schema migrations
//!
//! SQL files are embedded at compile time. Each applied migration records
//! its checksum in `schema_version`, and every run re-verifies the recorded
//! checksums before applying anything new.

mod catalog;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
