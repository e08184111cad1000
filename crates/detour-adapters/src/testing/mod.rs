mod failing_storage_area;

pub use failing_storage_area::FailingStorageArea;
