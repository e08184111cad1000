mod storage;

pub use storage::{MemoryStorage, MemoryStorageArea};
