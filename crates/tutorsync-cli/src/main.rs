//! tutorsync CLI
//!
//! Command-line interface over the synchronization engine

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tutorsync_core::errors::ExError;

use crate::commands::write::Mode;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tutorsync")]
#[command(about = "tutorsync - keep the record store and search index in step", long_about = None)]
struct Cli {
    /// TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an entity from a JSON document
    Create(commands::write::WriteArgs),
    /// Replace an entity from a JSON document carrying its id
    Update(commands::write::WriteArgs),
    /// Delete an entity by id
    Delete(commands::record::RecordArgs),
    /// Print an entity from the record store
    Get(commands::record::RecordArgs),
    /// List entities through the search index
    List(commands::list::ListArgs),
    /// Re-derive a search index from its record table
    Reconcile(commands::reconcile::ReconcileArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = commands::Session::open(cli.config.as_deref(), cli.db).and_then(|session| {
        let outcome = match cli.command {
            Commands::Create(args) => commands::write::execute(&session, Mode::Create, args),
            Commands::Update(args) => commands::write::execute(&session, Mode::Update, args),
            Commands::Delete(args) => commands::record::delete(&session, args),
            Commands::Get(args) => commands::record::get(&session, args),
            Commands::List(args) => commands::list::execute(&session, args),
            Commands::Reconcile(args) => commands::reconcile::execute(&session, args),
        };
        outcome.map_err(|e| e.with_request_id(session.ctx.request_id.clone()))
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

/// 2 for caller mistakes, 1 for everything else
fn exit_code(err: &ExError) -> i32 {
    if err.status() == 400 {
        2
    } else {
        1
    }
}
