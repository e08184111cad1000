use async_trait::async_trait;
use detour_core::{AreaId, StorageArea, StorageError};
use serde_json::Value;

pub struct FailingStorageArea {
    area: AreaId,
    fail_reads: bool,
    fail_writes: bool,
}

impl FailingStorageArea {
    pub fn unavailable(area: AreaId) -> Self {
        Self {
            area,
            fail_reads: true,
            fail_writes: true,
        }
    }

    pub fn read_only(area: AreaId) -> Self {
        Self {
            area,
            fail_reads: false,
            fail_writes: true,
        }
    }

    pub fn write_only(area: AreaId) -> Self {
        Self {
            area,
            fail_reads: true,
            fail_writes: false,
        }
    }
}

#[async_trait]
impl StorageArea for FailingStorageArea {
    fn area_id(&self) -> AreaId {
        self.area
    }

    async fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Read {
                message: "storage area unavailable".to_string(),
            });
        }
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Write {
                message: "quota exceeded".to_string(),
            });
        }
        Ok(())
    }
}
