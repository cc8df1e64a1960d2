//! Database connection management

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::errors::{from_rusqlite, io_error, Result};
use crate::migrations::apply_migrations;

/// One connection shared by every adapter of a process
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open a SQLite database at the given path, creating parent directories
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_error("open_database", e))?;
        }
    }
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with the pragmas every adapter expects
pub fn configure(conn: &Connection) -> Result<()> {
    // journal_mode returns a row, so it cannot go through execute()
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .map_err(from_rusqlite)?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .map_err(from_rusqlite)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(from_rusqlite)?;
    Ok(())
}

/// Open, configure and migrate a database, ready to share between adapters
pub fn open_shared<P: AsRef<Path>>(path: P) -> Result<SharedConnection> {
    let mut conn = open(path)?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory variant of [`open_shared`]
pub fn open_shared_in_memory() -> Result<SharedConnection> {
    let mut conn = open_in_memory()?;
    apply_migrations(&mut conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}
