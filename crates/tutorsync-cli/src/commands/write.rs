//! create / update from a JSON document

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::Value;
use tutorsync_core::errors::{ExError, ExErrorKind};
use tutorsync_core::EntityKind;

use super::{for_kind, invalid_input, print_json, warn_partial, Session};

#[derive(Debug, Clone, Copy)]
pub enum Mode {
    Create,
    Update,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// user, org, match or meeting (plural table names also accepted)
    pub kind: EntityKind,

    /// JSON document to write; `-` reads stdin
    #[arg(long)]
    pub file: PathBuf,
}

pub fn execute(session: &Session, mode: Mode, args: WriteArgs) -> Result<(), ExError> {
    let raw = read_document(&args.file)?;
    let ctx = &session.ctx;

    for_kind!(session, args.kind, |svc| {
        let result = match mode {
            Mode::Create => svc.coordinator.create(ctx, raw),
            Mode::Update => svc.coordinator.update(ctx, raw),
        };
        match result {
            Ok(entity) => print_json(&entity),
            Err(err) if err.is_partial() => {
                warn_partial(&err);
                let id = err.committed_id().unwrap_or_default();
                print_json(&svc.coordinator.fetch(ctx, id)?)
            }
            Err(err) => Err(err.into()),
        }
    })
}

fn read_document(path: &Path) -> Result<Value, ExError> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| io_error(path, e))?;
        text
    } else {
        std::fs::read_to_string(path).map_err(|e| io_error(path, e))?
    };
    serde_json::from_str(&text)
        .map_err(|e| invalid_input("read_document", format!("{}: {}", path.display(), e)))
}

fn io_error(path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op("read_document")
        .with_message(format!("{}: {}", path.display(), err))
}
