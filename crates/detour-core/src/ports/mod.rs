mod storage_area;

pub use storage_area::{AreaId, ChangeFeed, StorageArea, StorageChange, StorageError};
