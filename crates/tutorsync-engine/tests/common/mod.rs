use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tutorsync_core::errors::{IndexResult, StoreResult};
use tutorsync_core::query::{SearchRequest, SearchResponse};
use tutorsync_core::{
    Entity, IndexError, IndexName, IndexObject, IndexTask, RecordStore, SearchIndex, StoreError,
};
use tutorsync_core::{MemoryIndex, MemoryStore};
use tutorsync_engine::{EngineConfig, EntityServices};

#[allow(dead_code)]
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

/// Record store whose writes can be made to fail on demand
#[allow(dead_code)]
pub struct FlakyStore<E: Entity> {
    inner: MemoryStore<E>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

#[allow(dead_code)]
impl<E: Entity> FlakyStore<E> {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Transport {
                table: E::KIND.table(),
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}

impl<E: Entity> RecordStore<E> for FlakyStore<E> {
    fn insert(&self, entity: &E) -> StoreResult<E> {
        self.check(&self.fail_writes)?;
        self.inner.insert(entity)
    }

    fn update(&self, entity: &E) -> StoreResult<E> {
        self.check(&self.fail_writes)?;
        self.inner.update(entity)
    }

    fn remove(&self, id: &str) -> StoreResult<()> {
        self.check(&self.fail_writes)?;
        self.inner.remove(id)
    }

    fn fetch(&self, id: &str) -> StoreResult<E> {
        self.check(&self.fail_reads)?;
        self.inner.fetch(id)
    }

    fn list(&self) -> StoreResult<Vec<E>> {
        self.check(&self.fail_reads)?;
        self.inner.list()
    }
}

/// Search index whose writes or searches can be made to fail on demand
#[allow(dead_code)]
pub struct FlakyIndex {
    pub inner: MemoryIndex,
    fail_writes: AtomicBool,
    fail_search: AtomicBool,
}

#[allow(dead_code)]
impl FlakyIndex {
    pub fn new() -> Self {
        Self {
            inner: MemoryIndex::immediate(),
            fail_writes: AtomicBool::new(false),
            fail_search: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool, index: IndexName) -> IndexResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(IndexError::Transport {
                index,
                message: "503 service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl SearchIndex for FlakyIndex {
    fn upsert(&self, index: IndexName, object: IndexObject) -> IndexResult<IndexTask> {
        self.check(&self.fail_writes, index)?;
        self.inner.upsert(index, object)
    }

    fn remove(&self, index: IndexName, object_id: &str) -> IndexResult<IndexTask> {
        self.check(&self.fail_writes, index)?;
        self.inner.remove(index, object_id)
    }

    fn wait_until_visible(&self, task: &IndexTask) -> IndexResult<()> {
        self.inner.wait_until_visible(task)
    }

    fn search(&self, index: IndexName, request: &SearchRequest) -> IndexResult<SearchResponse> {
        self.check(&self.fail_search, index)?;
        self.inner.search(index, request)
    }

    fn object_ids(&self, index: IndexName) -> IndexResult<Vec<String>> {
        self.check(&self.fail_search, index)?;
        self.inner.object_ids(index)
    }
}

/// Services for one kind over failure-injecting adapters
#[allow(dead_code)]
pub struct Harness<E: Entity> {
    pub store: Arc<FlakyStore<E>>,
    pub index: Arc<FlakyIndex>,
    pub services: EntityServices<E>,
}

#[allow(dead_code)]
pub fn harness<E: Entity>() -> Harness<E> {
    harness_with(&EngineConfig::default())
}

#[allow(dead_code)]
pub fn harness_with<E: Entity>(config: &EngineConfig) -> Harness<E> {
    let store = Arc::new(FlakyStore::<E>::new());
    let index = Arc::new(FlakyIndex::new());
    let services = EntityServices::new(store.clone(), index.clone(), config);
    Harness {
        store,
        index,
        services,
    }
}

#[allow(dead_code)]
pub fn raw_match(id: &str) -> Value {
    json!({
        "id": id,
        "org": "o1",
        "people": [
            {"id": "u1", "name": "Tutor", "roles": ["tutor"]},
            {"id": "u2", "name": "Student", "roles": ["tutee"]}
        ],
        "subjects": ["Algebra"]
    })
}

#[allow(dead_code)]
pub fn raw_weekly_meeting(id: &str, match_id: &str, day: u32) -> Value {
    json!({
        "id": id,
        "org": "o1",
        "match": match_id,
        "people": ["u1", "u2"],
        "subjects": ["Algebra"],
        "time": {
            "from": at(day, 16),
            "to": at(day, 17),
            "recur": "RRULE:FREQ=WEEKLY"
        },
        "venue": {"url": "https://meet.example.org/algebra"}
    })
}
