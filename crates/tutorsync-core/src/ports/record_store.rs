use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::entity::Entity;
use crate::errors::StoreResult;

/// Authoritative store for one entity kind
///
/// Every method is a single round-trip on a single entity (or a full scan
/// for `list`); adapters never retry. Ids are compared by equality only.
pub trait RecordStore<E: Entity>: Send + Sync {
    /// Persist a new entity and return it as stored.
    ///
    /// An empty id is replaced by a fresh one; `created` and `updated` are
    /// stamped by the store regardless of what the caller supplied.
    ///
    /// # Errors
    ///
    /// `Conflict` if the id already exists, `Transport`/`Rejected` if the
    /// write did not happen.
    fn insert(&self, entity: &E) -> StoreResult<E>;

    /// Replace an existing row by id, keeping its `created` timestamp.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent.
    fn update(&self, entity: &E) -> StoreResult<E>;

    /// # Errors
    ///
    /// `NotFound` if the id is absent.
    fn remove(&self, id: &str) -> StoreResult<()>;

    /// # Errors
    ///
    /// `NotFound` if the id is absent, `Corrupt` if the row no longer parses.
    fn fetch(&self, id: &str) -> StoreResult<E>;

    /// Every stored entity, ordered by id.
    ///
    /// # Errors
    ///
    /// Fails on the first transport error or corrupt row.
    fn list(&self) -> StoreResult<Vec<E>>;
}

/// Current time at the millisecond precision every adapter stores
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Copy of `entity` as a store should persist it on insert
///
/// Assigns a time-ordered UUID when the id is empty and stamps
/// `created = updated = now`.
pub fn prepare_insert<E: Entity>(entity: &E) -> E {
    let mut stored = entity.clone();
    if stored.id().is_empty() {
        stored.set_id(Uuid::now_v7().to_string());
    }
    let at = now();
    stored.stamp(at, at);
    stored
}
