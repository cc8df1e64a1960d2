//! Migrations compiled into the binary

use sha2::{Digest, Sha256};

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

impl Migration {
    /// Hex SHA-256 of the SQL text, recorded when the migration is applied
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

/// In application order; ids are never reused
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "001_records",
        sql: include_str!("../../migrations/001_records.sql"),
    },
    Migration {
        id: "002_search_objects",
        sql: include_str!("../../migrations/002_search_objects.sql"),
    },
];
