use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::IndexResult;
use crate::projection::{IndexName, IndexObject};
use crate::query::{SearchRequest, SearchResponse};

/// Acknowledgment of an index write
///
/// Task ids increase monotonically per adapter; a write is visible to
/// `search` once `wait_until_visible` returns for its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTask {
    pub index: IndexName,
    pub task_id: u64,
}

impl fmt::Display for IndexTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.task_id)
    }
}

/// Secondary, eventually-consistent search index
pub trait SearchIndex: Send + Sync {
    /// Create or replace an object by its `objectID`.
    ///
    /// # Errors
    ///
    /// `Rejected` for an object without an id, `Transport` otherwise.
    fn upsert(&self, index: IndexName, object: IndexObject) -> IndexResult<IndexTask>;

    /// Delete an object. Removing an absent id succeeds.
    ///
    /// # Errors
    ///
    /// Only `Transport`.
    fn remove(&self, index: IndexName, object_id: &str) -> IndexResult<IndexTask>;

    /// Block until the task's write is visible to `search`.
    ///
    /// # Errors
    ///
    /// `UnknownTask` for a task this adapter never issued.
    fn wait_until_visible(&self, task: &IndexTask) -> IndexResult<()>;

    /// # Errors
    ///
    /// `Transport` when the index cannot be queried.
    fn search(&self, index: IndexName, request: &SearchRequest) -> IndexResult<SearchResponse>;

    /// Ids of every visible object in `index`, sorted.
    ///
    /// # Errors
    ///
    /// `Transport` when the index cannot be read.
    fn object_ids(&self, index: IndexName) -> IndexResult<Vec<String>>;

    /// Upsert and wait for visibility.
    ///
    /// # Errors
    ///
    /// Any error from either step.
    fn upsert_visible(&self, index: IndexName, object: IndexObject) -> IndexResult<IndexTask> {
        let task = self.upsert(index, object)?;
        self.wait_until_visible(&task)?;
        Ok(task)
    }

    /// Remove and wait for visibility.
    ///
    /// # Errors
    ///
    /// Any error from either step.
    fn remove_visible(&self, index: IndexName, object_id: &str) -> IndexResult<IndexTask> {
        let task = self.remove(index, object_id)?;
        self.wait_until_visible(&task)?;
        Ok(task)
    }
}
