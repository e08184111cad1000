//! Detour adapters - Storage substrate implementations
//!
//! This crate contains concrete implementations of the storage ports defined
//! in detour-core: a shared in-memory substrate and a SQLite-backed one.

mod change_bus;
pub mod memory;
pub mod sqlite;
pub mod testing;

pub use change_bus::ChangeBus;
pub use memory::{MemoryStorage, MemoryStorageArea};
pub use sqlite::{SqliteStorage, SqliteStorageArea};
pub use testing::FailingStorageArea;
