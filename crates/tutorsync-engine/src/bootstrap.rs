//! Service wiring
//!
//! Builds the single SQLite connection, the shared search index and every
//! coordinator, list service and reconciler once, from an `EngineConfig`.

use std::sync::Arc;

use tutorsync_core::errors::ExError;
use tutorsync_core::model::{Match, Meeting, Org, User};
use tutorsync_core::{Entity, RecordStore, SearchIndex};
use tutorsync_store::db::{open_shared, open_shared_in_memory};
use tutorsync_store::{SharedConnection, SqliteRecordStore, SqliteSearchIndex};

use crate::config::EngineConfig;
use crate::coordinator::Coordinator;
use crate::list::ListService;
use crate::reconcile::Reconciler;

/// Everything needed to serve one entity kind
pub struct EntityServices<E: Entity> {
    pub coordinator: Coordinator<E>,
    pub list: ListService<E>,
    pub reconciler: Reconciler<E>,
}

impl<E: Entity> EntityServices<E> {
    /// Wire services over arbitrary adapters
    pub fn new(
        store: Arc<dyn RecordStore<E>>,
        index: Arc<dyn SearchIndex>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            coordinator: Coordinator::new(store.clone(), index.clone())
                .with_options(config.visibility),
            list: ListService::new(store.clone(), index.clone()).with_options(config.listing),
            reconciler: Reconciler::new(store, index),
        }
    }
}

pub struct Services {
    pub users: EntityServices<User>,
    pub orgs: EntityServices<Org>,
    pub matches: EntityServices<Match>,
    pub meetings: EntityServices<Meeting>,
}

impl Services {
    /// Open (creating and migrating if needed) the configured database
    ///
    /// # Errors
    ///
    /// `Io` if the database directory cannot be created, `Store` if the
    /// database cannot be opened or migrated.
    pub fn open(config: &EngineConfig) -> Result<Self, ExError> {
        let conn = open_shared(&config.database_path)?;
        tracing::debug!(
            database_path = %config.database_path.display(),
            "record store opened"
        );
        Ok(Self::with_connection(conn, config))
    }

    /// Services over a private in-memory database
    ///
    /// # Errors
    ///
    /// `Store` if migrations fail.
    pub fn open_in_memory(config: &EngineConfig) -> Result<Self, ExError> {
        Ok(Self::with_connection(open_shared_in_memory()?, config))
    }

    pub fn with_connection(conn: SharedConnection, config: &EngineConfig) -> Self {
        let index: Arc<dyn SearchIndex> = Arc::new(SqliteSearchIndex::new(conn.clone()));
        Self {
            users: EntityServices::new(sqlite_store::<User>(&conn), index.clone(), config),
            orgs: EntityServices::new(sqlite_store::<Org>(&conn), index.clone(), config),
            matches: EntityServices::new(sqlite_store::<Match>(&conn), index.clone(), config),
            meetings: EntityServices::new(sqlite_store::<Meeting>(&conn), index, config),
        }
    }
}

fn sqlite_store<E: Entity>(conn: &SharedConnection) -> Arc<dyn RecordStore<E>> {
    Arc::new(SqliteRecordStore::<E>::new(conn.clone()))
}
