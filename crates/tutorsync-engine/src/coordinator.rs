//! Mutation coordinator
//!
//! Every mutation runs `Validated -> Stored -> Indexed`. The record store
//! is always written first and is never rolled back: if the index write
//! fails afterwards the call returns `SyncError::Index`, which callers
//! treat as a committed write with a lagging projection.
//!
//! ## Logging Ownership
//!
//! The coordinator owns lifecycle logging for mutations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_partial!` when only the index write failed
//! - `log_op_error!` on failure
//!
//! Adapters use only `tracing::debug!()` for internal details.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tutorsync_core::errors::{Result, StoreError, SyncError, ValidationError, Verb};
use tutorsync_core::{log_op_end, log_op_error, log_op_partial, log_op_start};
use tutorsync_core::{Entity, IndexError, IndexTask, RecordStore, SearchIndex};
use tutorsync_core_types::RequestContext;

/// How long an index write is attended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Return once the index acknowledged the write
    Acknowledged,
    /// Return once the write is visible to search
    Visible,
}

/// Per-operation index visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorOptions {
    pub create: Visibility,
    pub update: Visibility,
    pub delete: Visibility,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            create: Visibility::Acknowledged,
            update: Visibility::Visible,
            delete: Visibility::Acknowledged,
        }
    }
}

/// Progress of a single mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Validated,
    Stored,
    Indexed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validated => "validated",
            Phase::Stored => "stored",
            Phase::Indexed => "indexed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates writes of one entity kind across store and index
pub struct Coordinator<E: Entity> {
    store: Arc<dyn RecordStore<E>>,
    index: Arc<dyn SearchIndex>,
    options: CoordinatorOptions,
}

impl<E: Entity> Clone for Coordinator<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            index: self.index.clone(),
            options: self.options,
        }
    }
}

impl<E: Entity> Coordinator<E> {
    pub fn new(store: Arc<dyn RecordStore<E>>, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            store,
            index,
            options: CoordinatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> CoordinatorOptions {
        self.options
    }

    /// Create from a raw document
    ///
    /// # Errors
    ///
    /// `Validation` before any write, `Store` if the insert failed (including
    /// an id conflict), `Index` if the entity was created but not projected.
    pub fn create(&self, ctx: &RequestContext, raw: Value) -> Result<E> {
        self.observe(ctx, Verb::Create, None, || {
            let entity = parse::<E>(Verb::Create, raw)?;
            self.create_impl(entity)
        })
    }

    /// Create from a typed entity, running the same validation as [`create`](Self::create)
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub fn create_entity(&self, ctx: &RequestContext, entity: E) -> Result<E> {
        let id = non_empty(entity.id());
        self.observe(ctx, Verb::Create, id.as_deref(), || {
            entity.validate().map_err(|e| invalid::<E>(Verb::Create, e))?;
            self.create_impl(entity)
        })
    }

    /// Replace an entity from a raw document carrying its id
    ///
    /// # Errors
    ///
    /// `Validation` (including a missing id), `NotFound` if no such entity,
    /// `Store`, or `Index` if the update committed but was not projected.
    pub fn update(&self, ctx: &RequestContext, raw: Value) -> Result<E> {
        self.observe(ctx, Verb::Update, None, || {
            let entity = parse::<E>(Verb::Update, raw)?;
            self.update_impl(entity)
        })
    }

    /// Replace an entity from a typed value
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub fn update_entity(&self, ctx: &RequestContext, entity: E) -> Result<E> {
        let id = non_empty(entity.id());
        self.observe(ctx, Verb::Update, id.as_deref(), || {
            entity.validate().map_err(|e| invalid::<E>(Verb::Update, e))?;
            self.update_impl(entity)
        })
    }

    /// Remove an entity from the store, then from the index
    ///
    /// # Errors
    ///
    /// `NotFound` or `Store` leave the index untouched; `Index` means the
    /// row is gone but a stale projection may remain until the next sweep.
    pub fn delete(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.observe(ctx, Verb::Delete, Some(id), || self.delete_impl(id))
    }

    /// Read an entity from the record store; the index is never consulted
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent, `Store` otherwise.
    pub fn fetch(&self, ctx: &RequestContext, id: &str) -> Result<E> {
        self.observe(ctx, Verb::Fetch, Some(id), || {
            self.store
                .fetch(id)
                .map_err(|e| store_failure::<E>(Verb::Fetch, id, describe_id::<E>(id), e))
        })
    }

    fn create_impl(&self, mut entity: E) -> Result<E> {
        phase::<E>(Phase::Validated, entity.id());
        entity.recompute_tags();

        let stored = self.store.insert(&entity).map_err(|e| {
            store_failure::<E>(Verb::Create, entity.id(), entity.describe(), e)
        })?;
        phase::<E>(Phase::Stored, stored.id());

        self.project(Verb::Create, &stored, self.options.create)?;
        Ok(stored)
    }

    fn update_impl(&self, mut entity: E) -> Result<E> {
        if entity.id().is_empty() {
            return Err(invalid::<E>(
                Verb::Update,
                ValidationError::field(E::KIND, "id", "is required for update"),
            ));
        }
        phase::<E>(Phase::Validated, entity.id());
        entity.recompute_tags();

        let stored = self.store.update(&entity).map_err(|e| {
            store_failure::<E>(Verb::Update, entity.id(), entity.describe(), e)
        })?;
        phase::<E>(Phase::Stored, stored.id());

        self.project(Verb::Update, &stored, self.options.update)?;
        Ok(stored)
    }

    fn delete_impl(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(invalid::<E>(
                Verb::Delete,
                ValidationError::field(E::KIND, "id", "cannot be empty"),
            ));
        }
        phase::<E>(Phase::Validated, id);

        self.store
            .remove(id)
            .map_err(|e| store_failure::<E>(Verb::Delete, id, describe_id::<E>(id), e))?;
        phase::<E>(Phase::Stored, id);

        let index = E::KIND.index();
        let result = match self.options.delete {
            Visibility::Acknowledged => self.index.remove(index, id),
            Visibility::Visible => self.index.remove_visible(index, id),
        };
        result.map_err(|e| index_failure::<E>(Verb::Delete, id, describe_id::<E>(id), e))?;
        phase::<E>(Phase::Indexed, id);
        Ok(())
    }

    fn project(&self, verb: Verb, stored: &E, visibility: Visibility) -> Result<IndexTask> {
        let index = E::KIND.index();
        let object = stored.to_index_object();
        let result = match visibility {
            Visibility::Acknowledged => self.index.upsert(index, object),
            Visibility::Visible => self.index.upsert_visible(index, object),
        };
        let task =
            result.map_err(|e| index_failure::<E>(verb, stored.id(), stored.describe(), e))?;
        tracing::debug!(
            entity_kind = E::KIND.as_str(),
            entity_id = stored.id(),
            phase = Phase::Indexed.as_str(),
            task = %task,
        );
        Ok(task)
    }

    /// Run `f` inside a correlated span with lifecycle logging
    fn observe<T>(
        &self,
        ctx: &RequestContext,
        verb: Verb,
        id: Option<&str>,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let op = verb.as_str();
        let span = tracing::info_span!(
            "coordinator",
            request_id = ctx.request_id.as_str(),
            origin = ctx.origin_or_empty(),
            entity_kind = E::KIND.as_str(),
            op,
        );
        let _guard = span.enter();

        log_op_start!(op, entity_id = id.unwrap_or(""));
        let start = Instant::now();

        let result = f();
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!(op, duration_ms = duration_ms);
            }
            Err(err) if err.is_partial() => {
                log_op_partial!(op, err, duration_ms = duration_ms);
            }
            Err(err) => {
                log_op_error!(op, err, duration_ms = duration_ms);
            }
        }
        result
    }
}

fn parse<E: Entity>(verb: Verb, raw: Value) -> Result<E> {
    E::parse(raw).map_err(|e| invalid::<E>(verb, e))
}

fn invalid<E: Entity>(verb: Verb, source: ValidationError) -> SyncError {
    SyncError::Validation {
        verb,
        kind: E::KIND,
        source,
    }
}

/// A store `NotFound` on update, delete or fetch is the caller naming an
/// unknown id, so it surfaces as `SyncError::NotFound` (400) rather than `Store`.
fn store_failure<E: Entity>(verb: Verb, id: &str, entity: String, source: StoreError) -> SyncError {
    if source.is_not_found() {
        return SyncError::NotFound {
            verb,
            kind: E::KIND,
            id: id.to_string(),
        };
    }
    SyncError::Store {
        verb,
        kind: E::KIND,
        entity,
        source,
    }
}

fn index_failure<E: Entity>(verb: Verb, id: &str, entity: String, source: IndexError) -> SyncError {
    SyncError::Index {
        verb,
        kind: E::KIND,
        id: id.to_string(),
        entity,
        source,
    }
}

fn describe_id<E: Entity>(id: &str) -> String {
    format!("{} ({})", E::KIND, id)
}

fn non_empty(id: &str) -> Option<String> {
    (!id.is_empty()).then(|| id.to_string())
}

fn phase<E: Entity>(phase: Phase, id: &str) {
    tracing::debug!(
        entity_kind = E::KIND.as_str(),
        entity_id = id,
        phase = phase.as_str(),
    );
}
