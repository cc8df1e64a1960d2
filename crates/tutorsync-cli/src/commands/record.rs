//! get / delete by id

use clap::Args;
use tutorsync_core::errors::ExError;
use tutorsync_core::EntityKind;

use super::{for_kind, print_json, warn_partial, Session};

#[derive(Debug, Args)]
pub struct RecordArgs {
    pub kind: EntityKind,
    pub id: String,
}

pub fn get(session: &Session, args: RecordArgs) -> Result<(), ExError> {
    for_kind!(session, args.kind, |svc| {
        print_json(&svc.coordinator.fetch(&session.ctx, &args.id)?)
    })
}

pub fn delete(session: &Session, args: RecordArgs) -> Result<(), ExError> {
    let result = for_kind!(session, args.kind, |svc| {
        svc.coordinator.delete(&session.ctx, &args.id)
    });
    match result {
        Ok(()) => {}
        Err(err) if err.is_partial() => warn_partial(&err),
        Err(err) => return Err(err.into()),
    }
    println!("Deleted {} {}", args.kind, args.id);
    Ok(())
}
