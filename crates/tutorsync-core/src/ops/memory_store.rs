use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entity::Entity;
use crate::errors::{StoreError, StoreResult};
use crate::ports::record_store::{now, prepare_insert, RecordStore};

/// In-memory record store for one entity kind
///
/// Rows are kept in a `BTreeMap` so `list` is ordered by id like the SQLite
/// adapter. A poisoned lock is reported as a transport failure.
#[derive(Debug)]
pub struct MemoryStore<E: Entity> {
    rows: RwLock<BTreeMap<String, E>>,
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table() -> &'static str {
        E::KIND.table()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, E>>> {
        self.rows.read().map_err(|_| StoreError::Transport {
            table: Self::table(),
            message: "store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<String, E>>> {
        self.rows.write().map_err(|_| StoreError::Transport {
            table: Self::table(),
            message: "store lock poisoned".to_string(),
        })
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::NotFound {
            table: Self::table(),
            id: id.to_string(),
        }
    }
}

impl<E: Entity> RecordStore<E> for MemoryStore<E> {
    fn insert(&self, entity: &E) -> StoreResult<E> {
        let stored = prepare_insert(entity);
        let mut rows = self.write()?;
        if rows.contains_key(stored.id()) {
            return Err(StoreError::Conflict {
                table: Self::table(),
                id: stored.id().to_string(),
            });
        }
        rows.insert(stored.id().to_string(), stored.clone());
        Ok(stored)
    }

    fn update(&self, entity: &E) -> StoreResult<E> {
        let mut rows = self.write()?;
        let existing = rows
            .get(entity.id())
            .ok_or_else(|| Self::not_found(entity.id()))?;
        let mut stored = entity.clone();
        stored.stamp(existing.created(), now());
        rows.insert(stored.id().to_string(), stored.clone());
        Ok(stored)
    }

    fn remove(&self, id: &str) -> StoreResult<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    fn fetch(&self, id: &str) -> StoreResult<E> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    fn list(&self) -> StoreResult<Vec<E>> {
        Ok(self.read()?.values().cloned().collect())
    }
}
