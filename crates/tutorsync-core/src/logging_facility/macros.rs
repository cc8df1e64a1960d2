//! Operation logging macros
//!
//! Every event carries `component`, `op` and `event`; the event names come
//! from `tutorsync_core_types::schema`, so callers depend on that crate too.

/// Emit one operation event at the given level. Not for direct use.
#[doc(hidden)]
#[macro_export]
macro_rules! __op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Emit one failure event carrying the classified error. Not for direct use.
#[doc(hidden)]
#[macro_export]
macro_rules! __op_failure {
    ($level:ident, $event:expr, $op:expr, $err:expr, $duration:expr $(, $($field:tt)*)?) => {{
        let classified: $crate::errors::ExError = $err.into();
        $crate::__op_event!(
            $level,
            $op,
            $event,
            duration_ms = $duration,
            err.kind = ?classified.kind(),
            err.code = classified.code(),
            error = %classified,
            $($($field)*)?
        );
    }};
}

/// Log the start of an operation
///
/// ```
/// # use tutorsync_core::log_op_start;
/// log_op_start!("create");
/// log_op_start!("create", entity_kind = "match");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(
            info,
            $op,
            tutorsync_core_types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use tutorsync_core::log_op_end;
/// log_op_end!("create", duration_ms = 42);
/// log_op_end!("list", duration_ms = 3, hits = 10);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(
            info,
            $op,
            tutorsync_core_types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log a committed write whose index projection failed
///
/// The record store holds the new state, so this is a warning.
#[macro_export]
macro_rules! log_op_partial {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__op_failure!(
            warn,
            tutorsync_core_types::schema::EVENT_PARTIAL,
            $op,
            $err,
            $duration
            $(, $($field)*)?
        )
    };
}

/// Log an operation error
///
/// `$err` is anything convertible into `ExError`, typically `&SyncError`.
///
/// ```
/// # use tutorsync_core::log_op_error;
/// # use tutorsync_core::{EntityKind, SyncError, Verb};
/// let err = SyncError::NotFound {
///     verb: Verb::Fetch,
///     kind: EntityKind::Match,
///     id: "m1".to_string(),
/// };
/// log_op_error!("fetch", &err, duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__op_failure!(
            error,
            tutorsync_core_types::schema::EVENT_END_ERROR,
            $op,
            $err,
            $duration
            $(, $($field)*)?
        )
    };
}
