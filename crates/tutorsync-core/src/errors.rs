use std::fmt;

use thiserror::Error;
use tutorsync_core_types::RequestId;

use crate::entity::EntityKind;
use crate::projection::IndexName;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type returned by record store adapters
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type returned by search index adapters
pub type IndexResult<T> = std::result::Result<T, IndexError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code and to an HTTP-style status class
/// that the calling layer can hand straight to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    Validation,
    NotFound,

    // Authoritative store
    Store,
    Conflict,

    // Projection
    Index,

    // Integration/IO
    Serialization,
    Config,
    Io,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Store => "ERR_STORE",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::Index => "ERR_INDEX",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
        }
    }

    /// HTTP-style status classification
    ///
    /// 400 for caller mistakes (malformed input, unknown id), 500 for
    /// failures of either backing system. A conflict is a failed
    /// authoritative write and is classified with the store failures.
    pub fn status(&self) -> u16 {
        match self {
            ExErrorKind::Validation | ExErrorKind::NotFound => 400,
            _ => 500,
        }
    }
}

/// Canonical structured error type
///
/// A flattened, loggable view over any error raised by the pipeline. The
/// typed errors below convert into it at the boundary (logging macros, CLI).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_kind: Option<EntityKind>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_kind: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity kind context
    pub fn with_entity_kind(mut self, kind: EntityKind) -> Self {
        self.entity_kind = Some(kind);
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_kind(&self) -> Option<EntityKind> {
        self.entity_kind
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl fmt::Display for ExError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(kind) = self.entity_kind {
            write!(f, " (entity_kind: {})", kind)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// The verb a coordinator call was performing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Update,
    Delete,
    Fetch,
    List,
    Reconcile,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
            Verb::Fetch => "fetch",
            Verb::List => "list",
            Verb::Reconcile => "reconcile",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Verb::Create => "created",
            Verb::Update => "updated",
            Verb::Delete => "deleted",
            Verb::Fetch => "fetched",
            Verb::List => "listed",
            Verb::Reconcile => "reconciled",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input rejected before any store call was attempted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("malformed {kind} document: {reason}")]
    Malformed { kind: EntityKind, reason: String },

    #[error("invalid {kind} field `{field}`: {reason}")]
    InvalidField {
        kind: EntityKind,
        field: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn field(kind: EntityKind, field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            kind,
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            ValidationError::Malformed { kind, .. } | ValidationError::InvalidField { kind, .. } => {
                *kind
            }
        }
    }
}

/// Failure reported by a record store adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: String },

    #[error("{table} row {id} already exists")]
    Conflict { table: &'static str, id: String },

    #[error("{table} write for {id} rejected: {reason}")]
    Rejected {
        table: &'static str,
        id: String,
        reason: String,
    },

    #[error("{table} transport failure: {message}")]
    Transport {
        table: &'static str,
        message: String,
    },

    #[error("{table} row {id} is corrupt: {reason}")]
    Corrupt {
        table: &'static str,
        id: String,
        reason: String,
    },
}

impl StoreError {
    /// Transport failures may succeed on a caller-driven retry; every other
    /// kind will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transport { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Failure reported by a search index adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("index {index} transport failure: {message}")]
    Transport { index: IndexName, message: String },

    #[error("index {index} rejected object {object_id}: {reason}")]
    Rejected {
        index: IndexName,
        object_id: String,
        reason: String,
    },

    #[error("index task {task_id} on {index} is unknown")]
    UnknownTask { index: IndexName, task_id: u64 },
}

impl IndexError {
    pub fn index(&self) -> IndexName {
        match self {
            IndexError::Transport { index, .. }
            | IndexError::Rejected { index, .. }
            | IndexError::UnknownTask { index, .. } => *index,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, IndexError::Transport { .. })
    }
}

/// Error surfaced by the mutation coordinator and the list service
///
/// `Store` means the authoritative write failed and nothing changed.
/// `Index` means the authoritative write committed and only the projection
/// is behind; callers usually downgrade it to a warning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("cannot {verb} {kind}: {source}")]
    Validation {
        verb: Verb,
        kind: EntityKind,
        #[source]
        source: ValidationError,
    },

    #[error("failed to {verb} {entity}: {source}")]
    Store {
        verb: Verb,
        kind: EntityKind,
        entity: String,
        #[source]
        source: StoreError,
    },

    #[error("{entity} was {} in the record store but its projection failed: {source}", .verb.past_tense())]
    Index {
        verb: Verb,
        kind: EntityKind,
        id: String,
        entity: String,
        #[source]
        source: IndexError,
    },

    #[error("cannot {verb} {kind} {id}: not found")]
    NotFound {
        verb: Verb,
        kind: EntityKind,
        id: String,
    },

    /// The index could not answer a read and no fallback applied
    #[error("cannot {verb} {kind}: {source}")]
    Search {
        verb: Verb,
        kind: EntityKind,
        #[source]
        source: IndexError,
    },
}

impl SyncError {
    pub fn kind(&self) -> EntityKind {
        match self {
            SyncError::Validation { kind, .. }
            | SyncError::Store { kind, .. }
            | SyncError::Index { kind, .. }
            | SyncError::NotFound { kind, .. }
            | SyncError::Search { kind, .. } => *kind,
        }
    }

    pub fn verb(&self) -> Verb {
        match self {
            SyncError::Validation { verb, .. }
            | SyncError::Store { verb, .. }
            | SyncError::Index { verb, .. }
            | SyncError::NotFound { verb, .. }
            | SyncError::Search { verb, .. } => *verb,
        }
    }

    /// HTTP-style status classification, see [`ExErrorKind::status`]
    pub fn status(&self) -> u16 {
        ExError::from(self).status()
    }

    /// True when the authoritative write committed and only the index lags
    pub fn is_partial(&self) -> bool {
        matches!(self, SyncError::Index { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }

    /// True when a create collided with an existing id
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Store { source, .. } if source.is_conflict())
    }

    /// Id of the entity whose store write committed before the index failed
    pub fn committed_id(&self) -> Option<&str> {
        match self {
            SyncError::Index { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl From<&SyncError> for ExError {
    fn from(err: &SyncError) -> Self {
        match err {
            SyncError::Validation { verb, kind, source } => ExError::new(ExErrorKind::Validation)
                .with_op(verb.as_str())
                .with_entity_kind(*kind)
                .with_message(source.to_string()),

            SyncError::Store {
                verb,
                kind,
                entity,
                source,
            } => {
                let ex_kind = match source {
                    StoreError::Conflict { .. } => ExErrorKind::Conflict,
                    StoreError::Corrupt { .. } => ExErrorKind::Serialization,
                    _ => ExErrorKind::Store,
                };
                let mut ex = ExError::new(ex_kind)
                    .with_op(verb.as_str())
                    .with_entity_kind(*kind)
                    .with_message(format!("{}: {}", entity, source))
                    .with_source(adapter_cause(ex_kind, "record_store", source));
                if let Some(id) = store_error_id(source) {
                    ex = ex.with_entity_id(id);
                }
                ex
            }

            SyncError::Index {
                verb,
                kind,
                id,
                entity,
                source,
            } => ExError::new(ExErrorKind::Index)
                .with_op(verb.as_str())
                .with_entity_kind(*kind)
                .with_entity_id(id.clone())
                .with_message(format!("{}: {}", entity, source))
                .with_source(adapter_cause(ExErrorKind::Index, "search_index", source)),

            SyncError::NotFound { verb, kind, id } => ExError::new(ExErrorKind::NotFound)
                .with_op(verb.as_str())
                .with_entity_kind(*kind)
                .with_entity_id(id.clone())
                .with_message(format!("{} not found", kind)),

            SyncError::Search { verb, kind, source } => ExError::new(ExErrorKind::Index)
                .with_op(verb.as_str())
                .with_entity_kind(*kind)
                .with_message(source.to_string())
                .with_source(adapter_cause(ExErrorKind::Index, "search_index", source)),
        }
    }
}

impl From<SyncError> for ExError {
    fn from(err: SyncError) -> Self {
        ExError::from(&err)
    }
}

/// The adapter's own failure, kept as the `source` of the flattened error
fn adapter_cause(kind: ExErrorKind, adapter: &str, err: &dyn fmt::Display) -> ExError {
    ExError::new(kind)
        .with_op(adapter)
        .with_message(err.to_string())
}

fn store_error_id(err: &StoreError) -> Option<&str> {
    match err {
        StoreError::NotFound { id, .. }
        | StoreError::Conflict { id, .. }
        | StoreError::Rejected { id, .. }
        | StoreError::Corrupt { id, .. } => Some(id),
        StoreError::Transport { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_failure(source: StoreError) -> SyncError {
        SyncError::Store {
            verb: Verb::Create,
            kind: EntityKind::Match,
            entity: "Match (m1)".to_string(),
            source,
        }
    }

    #[test]
    fn test_status_classification() {
        let validation = SyncError::Validation {
            verb: Verb::Create,
            kind: EntityKind::User,
            source: ValidationError::field(EntityKind::User, "name", "cannot be empty"),
        };
        let not_found = SyncError::NotFound {
            verb: Verb::Fetch,
            kind: EntityKind::User,
            id: "u1".to_string(),
        };
        let store = store_failure(StoreError::Transport {
            table: "matches",
            message: "connection reset".to_string(),
        });
        let index = SyncError::Index {
            verb: Verb::Update,
            kind: EntityKind::Match,
            id: "m1".to_string(),
            entity: "Match (m1)".to_string(),
            source: IndexError::Transport {
                index: IndexName::Matches,
                message: "timeout".to_string(),
            },
        };

        assert_eq!(validation.status(), 400);
        assert_eq!(not_found.status(), 400);
        assert_eq!(store.status(), 500);
        assert_eq!(index.status(), 500);
        assert!(index.is_partial());
        assert!(!store.is_partial());
        assert_eq!(index.committed_id(), Some("m1"));
    }

    #[test]
    fn test_conflict_is_detectable() {
        let err = store_failure(StoreError::Conflict {
            table: "matches",
            id: "m1".to_string(),
        });
        assert!(err.is_conflict());

        let ex = ExError::from(&err);
        assert_eq!(ex.kind(), ExErrorKind::Conflict);
        assert_eq!(ex.code(), "ERR_CONFLICT");
        assert_eq!(ex.entity_id(), Some("m1"));
    }

    #[test]
    fn test_index_error_message_names_verb_and_entity() {
        let err = SyncError::Index {
            verb: Verb::Delete,
            kind: EntityKind::Meeting,
            id: "mt1".to_string(),
            entity: "Meeting (mt1)".to_string(),
            source: IndexError::Transport {
                index: IndexName::Meetings,
                message: "503".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("Meeting (mt1) was deleted"));
        assert!(msg.contains("meetings"));
    }

    #[test]
    fn test_store_error_keeps_cause() {
        use std::error::Error as _;

        let err = store_failure(StoreError::Rejected {
            table: "matches",
            id: "m1".to_string(),
            reason: "disk full".to_string(),
        });
        let cause = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(cause.contains("disk full"));
    }

    #[test]
    fn test_store_error_retryable() {
        assert!(StoreError::Transport {
            table: "users",
            message: "x".to_string()
        }
        .is_retryable());
        assert!(!StoreError::NotFound {
            table: "users",
            id: "u1".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_ex_error_display() {
        let ex = ExError::new(ExErrorKind::Store)
            .with_op("create")
            .with_entity_kind(EntityKind::Org)
            .with_entity_id("o1")
            .with_message("write rejected");
        let text = ex.to_string();
        assert!(text.starts_with("[ERR_STORE] in operation 'create': write rejected"));
        assert!(text.contains("(entity_kind: org)"));
        assert!(text.contains("(entity_id: o1)"));
    }

    #[test]
    fn test_flattened_error_chains_adapter_cause() {
        use std::error::Error as _;

        let err = store_failure(StoreError::Transport {
            table: "matches",
            message: "connection reset".to_string(),
        });
        let ex = ExError::from(&err);
        let cause = ex.source_error().unwrap();
        assert_eq!(cause.op(), Some("record_store"));
        assert_eq!(cause.kind(), ExErrorKind::Store);
        assert!(cause.message().contains("connection reset"));
        assert!(ex.source().is_some());

        let partial = SyncError::Index {
            verb: Verb::Delete,
            kind: EntityKind::Match,
            id: "m1".to_string(),
            entity: "Match (m1)".to_string(),
            source: IndexError::Transport {
                index: IndexName::Matches,
                message: "503".to_string(),
            },
        };
        let ex = ExError::from(&partial);
        assert_eq!(ex.source_error().and_then(ExError::op), Some("search_index"));

        let not_found = SyncError::NotFound {
            verb: Verb::Fetch,
            kind: EntityKind::Match,
            id: "m1".to_string(),
        };
        assert!(ExError::from(&not_found).source_error().is_none());
    }
}
