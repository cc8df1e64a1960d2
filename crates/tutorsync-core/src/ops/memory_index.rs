use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::errors::{IndexError, IndexResult};
use crate::ports::search_index::{IndexTask, SearchIndex};
use crate::projection::{IndexName, IndexObject};
use crate::query::{execute, SearchRequest, SearchResponse};

#[derive(Debug)]
enum Write {
    Upsert(IndexObject),
    Remove,
}

#[derive(Debug)]
struct Pending {
    task: IndexTask,
    object_id: String,
    write: Write,
}

#[derive(Debug, Default)]
struct State {
    visible: BTreeMap<IndexName, BTreeMap<String, IndexObject>>,
    pending: VecDeque<Pending>,
    next_task: u64,
}

impl State {
    /// Apply queued writes in issue order up to and including `task_id`
    fn apply_through(&mut self, task_id: u64) {
        while self
            .pending
            .front()
            .is_some_and(|p| p.task.task_id <= task_id)
        {
            let Some(p) = self.pending.pop_front() else {
                break;
            };
            let objects = self.visible.entry(p.task.index).or_default();
            match p.write {
                Write::Upsert(object) => {
                    objects.insert(p.object_id, object);
                }
                Write::Remove => {
                    objects.remove(&p.object_id);
                }
            }
        }
    }
}

/// In-memory search index with asynchronous visibility
///
/// Writes are acknowledged immediately but only become visible to
/// `search` once their task is waited on or the index is flushed. Built
/// with [`MemoryIndex::immediate`], every write is visible on return.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    state: Mutex<State>,
    immediate: bool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate() -> Self {
        Self {
            state: Mutex::default(),
            immediate: true,
        }
    }

    /// Make every acknowledged write visible
    pub fn flush(&self) {
        if let Ok(mut state) = self.state.lock() {
            let last = state.next_task;
            state.apply_through(last);
        }
    }

    /// Number of acknowledged writes not yet visible
    pub fn pending_len(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    /// Visible object by id, bypassing search
    pub fn get(&self, index: IndexName, object_id: &str) -> Option<IndexObject> {
        self.state
            .lock()
            .ok()?
            .visible
            .get(&index)?
            .get(object_id)
            .cloned()
    }

    fn lock(&self, index: IndexName) -> IndexResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| IndexError::Transport {
            index,
            message: "index lock poisoned".to_string(),
        })
    }

    fn enqueue(&self, index: IndexName, object_id: String, write: Write) -> IndexResult<IndexTask> {
        let mut state = self.lock(index)?;
        state.next_task += 1;
        let task = IndexTask {
            index,
            task_id: state.next_task,
        };
        state.pending.push_back(Pending {
            task,
            object_id,
            write,
        });
        if self.immediate {
            state.apply_through(task.task_id);
        }
        Ok(task)
    }
}

impl SearchIndex for MemoryIndex {
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
        self.enqueue(index, object_id, Write::Upsert(object))
    }

    fn remove(&self, index: IndexName, object_id: &str) -> IndexResult<IndexTask> {
        self.enqueue(index, object_id.to_string(), Write::Remove)
    }

    fn wait_until_visible(&self, task: &IndexTask) -> IndexResult<()> {
        let mut state = self.lock(task.index)?;
        if task.task_id == 0 || task.task_id > state.next_task {
            return Err(IndexError::UnknownTask {
                index: task.index,
                task_id: task.task_id,
            });
        }
        state.apply_through(task.task_id);
        Ok(())
    }

    fn search(&self, index: IndexName, request: &SearchRequest) -> IndexResult<SearchResponse> {
        let state = self.lock(index)?;
        let objects = state.visible.get(&index).into_iter().flat_map(|m| m.values());
        Ok(execute(objects, request))
    }

    fn object_ids(&self, index: IndexName) -> IndexResult<Vec<String>> {
        let state = self.lock(index)?;
        Ok(state
            .visible
            .get(&index)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default())
    }
}
