//! SQLite record store
//!
//! Each entity kind lives in its own table (`users`, `orgs`, `matches`,
//! `meetings`). The serialized entity is stored in `body_json`; the
//! timestamp columns are authoritative and override whatever the body says.

#![allow(clippy::result_large_err)]

use std::marker::PhantomData;
use std::sync::MutexGuard;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tutorsync_core::errors::{StoreError, StoreResult};
use tutorsync_core::ports::{now, prepare_insert};
use tutorsync_core::{Entity, RecordStore};

use crate::db::SharedConnection;
use crate::errors::{lock_poisoned, store_error};

/// Record store for entity kind `E`
pub struct SqliteRecordStore<E: Entity> {
    conn: SharedConnection,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for SqliteRecordStore<E> {
    fn clone(&self) -> Self {
        Self::new(self.conn.clone())
    }
}

impl<E: Entity> SqliteRecordStore<E> {
    /// Wrap a migrated connection
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    fn table() -> &'static str {
        E::KIND.table()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned(Self::table()))
    }

    fn encode(entity: &E) -> StoreResult<String> {
        serde_json::to_string(entity).map_err(|e| StoreError::Rejected {
            table: Self::table(),
            id: entity.id().to_string(),
            reason: e.to_string(),
        })
    }

    fn decode(id: &str, body: &str, created_at: i64, updated_at: i64) -> StoreResult<E> {
        let corrupt = |reason: String| StoreError::Corrupt {
            table: Self::table(),
            id: id.to_string(),
            reason,
        };
        let value: Value = serde_json::from_str(body).map_err(|e| corrupt(e.to_string()))?;
        let mut entity = E::parse(value).map_err(|e| corrupt(e.to_string()))?;
        let created = millis(created_at).ok_or_else(|| corrupt("bad created_at".to_string()))?;
        let updated = millis(updated_at).ok_or_else(|| corrupt("bad updated_at".to_string()))?;
        entity.stamp(created, updated);
        Ok(entity)
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::NotFound {
            table: Self::table(),
            id: id.to_string(),
        }
    }
}

fn millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl<E: Entity> RecordStore<E> for SqliteRecordStore<E> {
    fn insert(&self, entity: &E) -> StoreResult<E> {
        let stored = prepare_insert(entity);
        let body = Self::encode(&stored)?;
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, body_json, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                Self::table()
            ),
            rusqlite::params![
                stored.id(),
                body,
                stored.created().timestamp_millis(),
                stored.updated().timestamp_millis(),
            ],
        )
        .map_err(|e| {
            if is_primary_key_violation(&e) {
                StoreError::Conflict {
                    table: Self::table(),
                    id: stored.id().to_string(),
                }
            } else {
                store_error(Self::table(), stored.id(), e)
            }
        })?;

        tracing::debug!(table = Self::table(), id = stored.id(), "row inserted");
        Ok(stored)
    }

    fn update(&self, entity: &E) -> StoreResult<E> {
        let table = Self::table();
        let id = entity.id();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| store_error(table, id, e))?;

        let created_at: Option<i64> = tx
            .query_row(
                &format!("SELECT created_at FROM {} WHERE id = ?1", table),
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| store_error(table, id, e))?;
        let created_at = created_at.ok_or_else(|| Self::not_found(id))?;

        let mut stored = entity.clone();
        let created = millis(created_at).ok_or_else(|| StoreError::Corrupt {
            table,
            id: id.to_string(),
            reason: "bad created_at".to_string(),
        })?;
        stored.stamp(created, now());
        let body = Self::encode(&stored)?;

        tx.execute(
            &format!(
                "UPDATE {} SET body_json = ?2, updated_at = ?3 WHERE id = ?1",
                table
            ),
            rusqlite::params![id, body, stored.updated().timestamp_millis()],
        )
        .map_err(|e| store_error(table, id, e))?;
        tx.commit().map_err(|e| store_error(table, id, e))?;

        tracing::debug!(table, id, "row updated");
        Ok(stored)
    }

    fn remove(&self, id: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", Self::table()),
                [id],
            )
            .map_err(|e| store_error(Self::table(), id, e))?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        tracing::debug!(table = Self::table(), id, "row removed");
        Ok(())
    }

    fn fetch(&self, id: &str) -> StoreResult<E> {
        let conn = self.lock()?;
        let row: Option<(String, i64, i64)> = conn
            .query_row(
                &format!(
                    "SELECT body_json, created_at, updated_at FROM {} WHERE id = ?1",
                    Self::table()
                ),
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| store_error(Self::table(), id, e))?;
        let (body, created_at, updated_at) = row.ok_or_else(|| Self::not_found(id))?;
        Self::decode(id, &body, created_at, updated_at)
    }

    fn list(&self) -> StoreResult<Vec<E>> {
        let table = Self::table();
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, body_json, created_at, updated_at FROM {} ORDER BY id",
                table
            ))
            .map_err(|e| store_error(table, "*", e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(|e| store_error(table, "*", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| store_error(table, "*", e))?;

        rows.iter()
            .map(|(id, body, created_at, updated_at)| {
                Self::decode(id, body, *created_at, *updated_at)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_shared_in_memory;
    use tutorsync_core::model::{Org, User};

    #[test]
    fn test_insert_fetch_round_trip() {
        let store = SqliteRecordStore::<Org>::new(open_shared_in_memory().unwrap());
        let mut org = Org::new("Academy");
        org.subjects = vec!["Algebra".to_string()];
        let stored = store.insert(&org).unwrap();
        assert_eq!(store.fetch(&stored.id).unwrap(), stored);
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let store = SqliteRecordStore::<User>::new(open_shared_in_memory().unwrap());
        let mut user = User::new("Ada");
        user.id = "u1".to_string();
        store.insert(&user).unwrap();
        assert!(store.insert(&user).unwrap_err().is_conflict());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let store = SqliteRecordStore::<User>::new(open_shared_in_memory().unwrap());
        assert!(store.remove("ghost").unwrap_err().is_not_found());
    }
}
