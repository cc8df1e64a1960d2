//! Command implementations and the state they share

use std::path::{Path, PathBuf};

use serde::Serialize;
use tutorsync_core::errors::{ExError, ExErrorKind, SyncError};
use tutorsync_core::logging_facility;
use tutorsync_core_types::RequestContext;
use tutorsync_engine::{EngineConfig, Services};

pub mod list;
pub mod reconcile;
pub mod record;
pub mod write;

/// Services plus the request context of one CLI invocation
pub struct Session {
    pub services: Services,
    pub ctx: RequestContext,
}

impl Session {
    pub fn open(config: Option<&Path>, db: Option<PathBuf>) -> Result<Self, ExError> {
        let mut config = match config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(db) = db {
            config.database_path = db;
        }
        logging_facility::init(config.log_profile);

        Ok(Self {
            services: Services::open(&config)?,
            ctx: RequestContext::new().with_origin("cli"),
        })
    }
}

/// Run `$body` with `$svc` bound to the services of `$kind`
macro_rules! for_kind {
    ($session:expr, $kind:expr, |$svc:ident| $body:expr) => {
        match $kind {
            tutorsync_core::EntityKind::User => {
                let $svc = &$session.services.users;
                $body
            }
            tutorsync_core::EntityKind::Org => {
                let $svc = &$session.services.orgs;
                $body
            }
            tutorsync_core::EntityKind::Match => {
                let $svc = &$session.services.matches;
                $body
            }
            tutorsync_core::EntityKind::Meeting => {
                let $svc = &$session.services.meetings;
                $body
            }
        }
    };
}
pub(crate) use for_kind;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), ExError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        ExError::new(ExErrorKind::Serialization)
            .with_op("print")
            .with_message(e.to_string())
    })?;
    println!("{}", text);
    Ok(())
}

/// Report a committed write whose projection failed and carry on
pub fn warn_partial(err: &SyncError) {
    eprintln!("Warning: {}", err);
    eprintln!("  run `tutorsync reconcile {}` once the index is reachable", err.kind());
}

pub fn invalid_input(op: &str, message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Validation)
        .with_op(op)
        .with_message(message)
}
