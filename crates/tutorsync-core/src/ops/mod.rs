//! In-process adapters for embedding and tests

pub mod memory_index;
pub mod memory_store;

pub use memory_index::MemoryIndex;
pub use memory_store::MemoryStore;
