//! SQLite-backed search index
//!
//! Projections are stored as JSON in `search_objects`. Every write is
//! logged in `search_tasks`, whose row id is the task id. Writes are
//! visible as soon as they commit, so waiting only checks that the task
//! exists. Queries load the index's objects and evaluate them in-process.

#![allow(clippy::result_large_err)]

use std::sync::MutexGuard;

use rusqlite::{Connection, OptionalExtension};
use tutorsync_core::errors::{IndexError, IndexResult};
use tutorsync_core::query::execute;
use tutorsync_core::{IndexName, IndexObject, IndexTask, SearchIndex, SearchRequest, SearchResponse};

use crate::db::SharedConnection;
use crate::errors::index_error;

#[derive(Clone)]
pub struct SqliteSearchIndex {
    conn: SharedConnection,
}

impl SqliteSearchIndex {
    /// Wrap a migrated connection
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn lock(&self, index: IndexName) -> IndexResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| IndexError::Transport {
            index,
            message: "connection lock poisoned".to_string(),
        })
    }

    fn load(&self, index: IndexName) -> IndexResult<Vec<IndexObject>> {
        let conn = self.lock(index)?;
        let mut stmt = conn
            .prepare(
                "SELECT object_id, object_json FROM search_objects
                 WHERE index_name = ?1 ORDER BY object_id",
            )
            .map_err(|e| index_error(index, e))?;
        let rows = stmt
            .query_map([index.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| index_error(index, e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| index_error(index, e))?;

        let mut objects = Vec::with_capacity(rows.len());
        for (object_id, json) in rows {
            match serde_json::from_str::<IndexObject>(&json) {
                Ok(object) => objects.push(object),
                // Unreadable rows are invisible to search; the next upsert repairs them.
                Err(e) => tracing::warn!(
                    index = index.as_str(),
                    object_id,
                    error = %e,
                    "skipping unreadable index object"
                ),
            }
        }
        Ok(objects)
    }
}

fn record_task(
    tx: &rusqlite::Transaction<'_>,
    index: IndexName,
    object_id: &str,
    action: &str,
) -> rusqlite::Result<u64> {
    tx.execute(
        "INSERT INTO search_tasks (index_name, object_id, action, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            index.as_str(),
            object_id,
            action,
            chrono::Utc::now().timestamp_millis()
        ],
    )?;
    Ok(tx.last_insert_rowid() as u64)
}

impl SearchIndex for SqliteSearchIndex {
    fn upsert(&self, index: IndexName, object: IndexObject) -> IndexResult<IndexTask> {
        let object_id = match object.object_id() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(IndexError::Rejected {
                    index,
                    object_id: String::new(),
                    reason: "object has no objectID".to_string(),
                })
            }
        };
        let json = serde_json::to_string(&object).map_err(|e| IndexError::Rejected {
            index,
            object_id: object_id.clone(),
            reason: e.to_string(),
        })?;

        let mut conn = self.lock(index)?;
        let tx = conn.transaction().map_err(|e| index_error(index, e))?;
        let task_id = record_task(&tx, index, &object_id, "upsert").map_err(|e| index_error(index, e))?;
        tx.execute(
            "INSERT INTO search_objects (index_name, object_id, object_json, task_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(index_name, object_id) DO UPDATE SET
                object_json = excluded.object_json,
                task_id = excluded.task_id",
            rusqlite::params![index.as_str(), object_id, json, task_id as i64],
        )
        .map_err(|e| index_error(index, e))?;
        tx.commit().map_err(|e| index_error(index, e))?;

        Ok(IndexTask { index, task_id })
    }

    fn remove(&self, index: IndexName, object_id: &str) -> IndexResult<IndexTask> {
        let mut conn = self.lock(index)?;
        let tx = conn.transaction().map_err(|e| index_error(index, e))?;
        let task_id = record_task(&tx, index, object_id, "remove").map_err(|e| index_error(index, e))?;
        tx.execute(
            "DELETE FROM search_objects WHERE index_name = ?1 AND object_id = ?2",
            rusqlite::params![index.as_str(), object_id],
        )
        .map_err(|e| index_error(index, e))?;
        tx.commit().map_err(|e| index_error(index, e))?;

        Ok(IndexTask { index, task_id })
    }

    fn wait_until_visible(&self, task: &IndexTask) -> IndexResult<()> {
        let conn = self.lock(task.index)?;
        let known: Option<i64> = conn
            .query_row(
                "SELECT id FROM search_tasks WHERE id = ?1 AND index_name = ?2",
                rusqlite::params![task.task_id as i64, task.index.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| index_error(task.index, e))?;
        match known {
            Some(_) => Ok(()),
            None => Err(IndexError::UnknownTask {
                index: task.index,
                task_id: task.task_id,
            }),
        }
    }

    fn search(&self, index: IndexName, request: &SearchRequest) -> IndexResult<SearchResponse> {
        let objects = self.load(index)?;
        Ok(execute(&objects, request))
    }

    fn object_ids(&self, index: IndexName) -> IndexResult<Vec<String>> {
        let conn = self.lock(index)?;
        let mut stmt = conn
            .prepare("SELECT object_id FROM search_objects WHERE index_name = ?1 ORDER BY object_id")
            .map_err(|e| index_error(index, e))?;
        let ids = stmt
            .query_map([index.as_str()], |row| row.get(0))
            .map_err(|e| index_error(index, e))?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(|e| index_error(index, e))?;
        Ok(ids)
    }
}
