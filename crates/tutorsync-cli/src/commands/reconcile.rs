//! Reconciliation sweep

use clap::Args;
use tutorsync_core::errors::ExError;
use tutorsync_core::EntityKind;

use super::{for_kind, print_json, Session};

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    pub kind: EntityKind,
}

/// Unlike single-entity writes, an index failure here fails the command:
/// the sweep exists only to repair the index.
pub fn execute(session: &Session, args: ReconcileArgs) -> Result<(), ExError> {
    let report = for_kind!(session, args.kind, |svc| svc.reconciler.sweep(&session.ctx))?;
    print_json(&report)
}
