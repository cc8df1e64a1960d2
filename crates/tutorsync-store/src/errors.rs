//! Error handling for tutorsync-store
//!
//! Setup paths (opening, migrating) report `ExError`; adapter calls map
//! `rusqlite` failures into the `StoreError`/`IndexError` kinds the
//! coordinator understands.

use tutorsync_core::errors::{ExError, ExErrorKind, IndexError, StoreError};
use tutorsync_core::IndexName;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Store)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Store)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Store)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Map a failed statement on `table` into a store error
///
/// Constraint violations mean the database refused the write; everything
/// else is treated as a transport failure the caller may retry.
pub fn store_error(table: &'static str, id: &str, err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Rejected {
                table,
                id: id.to_string(),
                reason: err.to_string(),
            }
        }
        _ => StoreError::Transport {
            table,
            message: err.to_string(),
        },
    }
}

pub fn lock_poisoned(table: &'static str) -> StoreError {
    StoreError::Transport {
        table,
        message: "connection lock poisoned".to_string(),
    }
}

pub fn index_error(index: IndexName, err: rusqlite::Error) -> IndexError {
    IndexError::Transport {
        index,
        message: err.to_string(),
    }
}
