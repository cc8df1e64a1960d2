#![allow(clippy::result_large_err)]

use std::collections::HashMap;

use rusqlite::{params, Connection};

use super::catalog::{Migration, MIGRATIONS};
use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    migration_id TEXT NOT NULL UNIQUE,
    applied_at INTEGER NOT NULL,
    checksum TEXT
)";

/// Bring the schema up to date
///
/// Fails without applying anything if an already-applied migration no
/// longer matches its embedded SQL.
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(LEDGER_DDL).map_err(from_rusqlite)?;
    let recorded = recorded_checksums(conn)?;

    for migration in MIGRATIONS {
        if let Some(Some(expected)) = recorded.get(migration.id) {
            let actual = migration.checksum();
            if *expected != actual {
                return Err(checksum_mismatch(migration.id, expected, &actual));
            }
        }
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !recorded.contains_key(m.id))
        .collect();
    for migration in &pending {
        apply_one(conn, migration)?;
    }

    tracing::debug!(
        component = module_path!(),
        op = "apply_migrations",
        applied = pending.len(),
        "schema up to date"
    );
    Ok(())
}

/// Ids of applied migrations, oldest first
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(from_rusqlite)?;
    let ids = rows
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}

/// Checksum per applied migration; `None` for rows recorded without one
fn recorded_checksums(conn: &Connection) -> Result<HashMap<String, Option<String>>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })
        .map_err(from_rusqlite)?;
    let recorded = rows
        .collect::<rusqlite::Result<HashMap<_, _>>>()
        .map_err(from_rusqlite)?;
    Ok(recorded)
}

fn apply_one(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        params![
            migration.id,
            chrono::Utc::now().timestamp(),
            migration.checksum()
        ],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    tracing::info!(
        component = module_path!(),
        op = "apply_migration",
        migration_id = migration.id,
        "migration applied"
    );
    Ok(())
}
