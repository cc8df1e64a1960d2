//! tutorsync engine - orchestration over the record store and search index
//!
//! Provides:
//! - `Coordinator<E>`: ordered create/update/delete across both systems
//! - `ListService<E>`: filtered listing from the index with store fallback
//! - `Reconciler<E>`: sweep re-deriving an index from its table
//! - `EngineConfig` and `Services` for wiring it all from a TOML file

pub mod bootstrap;
pub mod config;
pub mod coordinator;
pub mod list;
pub mod reconcile;

pub use bootstrap::{EntityServices, Services};
pub use config::EngineConfig;
pub use coordinator::{Coordinator, CoordinatorOptions, Phase, Visibility};
pub use list::{ListPage, ListService, ListingOptions};
pub use reconcile::{Reconciler, SweepReport};
