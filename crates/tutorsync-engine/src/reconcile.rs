//! Reconciliation sweep
//!
//! Re-derives an index from its record table: every stored entity is
//! re-projected, and index objects with no matching row (left behind by a
//! delete whose index write failed) are removed. Each index write is checked
//! against the row as it stands at that moment, so a mutation that commits
//! mid-sweep is never undone.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tutorsync_core::errors::{IndexError, Result, StoreError, SyncError, Verb};
use tutorsync_core::{log_op_end, log_op_error, log_op_partial, log_op_start};
use tutorsync_core::{Entity, RecordStore, SearchIndex};
use tutorsync_core_types::RequestContext;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entities whose projection was rewritten
    pub reindexed: usize,
    /// Orphaned index objects deleted
    pub removed: usize,
}

pub struct Reconciler<E: Entity> {
    store: Arc<dyn RecordStore<E>>,
    index: Arc<dyn SearchIndex>,
}

impl<E: Entity> Clone for Reconciler<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            index: self.index.clone(),
        }
    }
}

impl<E: Entity> Reconciler<E> {
    pub fn new(store: Arc<dyn RecordStore<E>>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    /// Sweep the whole kind
    ///
    /// Individual index failures do not stop the sweep. Each is logged and
    /// the first one is returned once the rest is done.
    ///
    /// # Errors
    ///
    /// `Store` if the table cannot be read (nothing is touched) or for the
    /// first row that could not be re-read, `Search` if the index cannot
    /// enumerate its objects, `Index` for the first object that could not be
    /// written.
    pub fn sweep(&self, ctx: &RequestContext) -> Result<SweepReport> {
        let span = tracing::info_span!(
            "reconcile",
            request_id = ctx.request_id.as_str(),
            origin = ctx.origin_or_empty(),
            entity_kind = E::KIND.as_str(),
        );
        let _guard = span.enter();

        log_op_start!("reconcile");
        let start = Instant::now();

        let result = self.sweep_impl();
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok((report, None)) => {
                log_op_end!(
                    "reconcile",
                    duration_ms = duration_ms,
                    reindexed = report.reindexed as u64,
                    removed = report.removed as u64,
                );
            }
            Ok((_, Some(err))) => {
                log_op_partial!("reconcile", err, duration_ms = duration_ms);
            }
            Err(err) => {
                log_op_error!("reconcile", err, duration_ms = duration_ms);
            }
        }

        result.and_then(|(report, failure)| failure.map_or(Ok(report), Err))
    }

    fn sweep_impl(&self) -> Result<(SweepReport, Option<SyncError>)> {
        let index = E::KIND.index();
        let entities = self
            .store
            .list()
            .map_err(|source| self.store_failure(E::KIND.table().to_string(), source))?;

        let mut report = SweepReport::default();
        let mut first_failure: Option<SyncError> = None;

        // Rows may change while the sweep runs, so every index write is
        // decided by a fresh read of the row it touches.
        let mut live = BTreeSet::new();
        for listed in &entities {
            let id = listed.id();
            live.insert(id.to_string());
            match self.current(id) {
                Ok(Some(entity)) => {
                    match self.index.upsert_visible(index, entity.to_index_object()) {
                        Ok(_) => report.reindexed += 1,
                        Err(source) => {
                            let err = self.index_failure(id, entity.describe(), source);
                            first_failure.get_or_insert(err);
                        }
                    }
                }
                Ok(None) => match self.index.remove_visible(index, id) {
                    Ok(_) => report.removed += 1,
                    Err(source) => {
                        let err = self.index_failure(id, listed.describe(), source);
                        first_failure.get_or_insert(err);
                    }
                },
                Err(err) => {
                    first_failure.get_or_insert(err);
                }
            }
        }

        let indexed = self.index.object_ids(index).map_err(|source| SyncError::Search {
            verb: Verb::Reconcile,
            kind: E::KIND,
            source,
        })?;
        for orphan in indexed.iter().filter(|id| !live.contains(*id)) {
            match self.current(orphan) {
                // Created after the listing; its own write owns the projection.
                Ok(Some(_)) => {}
                Ok(None) => match self.index.remove_visible(index, orphan) {
                    Ok(_) => report.removed += 1,
                    Err(source) => {
                        let entity = format!("{} ({})", E::KIND, orphan);
                        let err = self.index_failure(orphan, entity, source);
                        first_failure.get_or_insert(err);
                    }
                },
                Err(err) => {
                    first_failure.get_or_insert(err);
                }
            }
        }

        Ok((report, first_failure))
    }

    /// The row as stored right now; `None` once it is gone
    fn current(&self, id: &str) -> Result<Option<E>> {
        match self.store.fetch(id) {
            Ok(entity) => Ok(Some(entity)),
            Err(source) if source.is_not_found() => Ok(None),
            Err(source) => {
                let err = self.store_failure(format!("{} ({})", E::KIND, id), source);
                tracing::warn!(entity_id = id, error = %err, "sweep could not read row");
                Err(err)
            }
        }
    }

    fn store_failure(&self, entity: String, source: StoreError) -> SyncError {
        SyncError::Store {
            verb: Verb::Reconcile,
            kind: E::KIND,
            entity,
            source,
        }
    }

    fn index_failure(&self, id: &str, entity: String, source: IndexError) -> SyncError {
        let err = SyncError::Index {
            verb: Verb::Reconcile,
            kind: E::KIND,
            id: id.to_string(),
            entity,
            source,
        };
        tracing::warn!(entity_id = id, error = %err, "sweep could not write projection");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorsync_core::model::Org;
    use tutorsync_core::{IndexName, MemoryIndex, MemoryStore};

    #[test]
    fn test_sweep_reindexes_and_removes_orphans() {
        let store = Arc::new(MemoryStore::<Org>::new());
        let index = Arc::new(MemoryIndex::immediate());

        let mut org = Org::new("Academy");
        org.id = "o1".to_string();
        store.insert(&org).unwrap();

        let mut ghost = Org::new("Closed");
        ghost.id = "o9".to_string();
        index
            .upsert(IndexName::Orgs, ghost.to_index_object())
            .unwrap();

        let reconciler = Reconciler::new(store, index.clone());
        let report = reconciler.sweep(&RequestContext::new()).unwrap();
        assert_eq!(report.reindexed, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(index.object_ids(IndexName::Orgs).unwrap(), vec!["o1"]);
    }
}
