use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use detour_core::{AreaId, ChangeFeed, StorageArea, StorageChange, StorageError};

use crate::ChangeBus;

#[derive(Default)]
struct MemoryState {
    entries: Mutex<HashMap<(AreaId, String), Value>>,
    changes: ChangeBus,
}

/// In-process storage substrate shared by every handle cloned from it.
///
/// Several stores opened on the same `MemoryStorage` behave like several open
/// instances: each write is echoed to all subscribers, the writer included.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<MemoryState>,
}

pub struct MemoryStorageArea {
    area: AreaId,
    state: Arc<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn area(&self, area: AreaId) -> MemoryStorageArea {
        MemoryStorageArea {
            area,
            state: Arc::clone(&self.state),
        }
    }

    pub fn value(&self, area: AreaId, key: &str) -> Option<Value> {
        self.state
            .entries
            .lock()
            .ok()?
            .get(&(area, key.to_string()))
            .cloned()
    }
}

impl ChangeFeed for MemoryStorage {
    fn subscribe(&self) -> BoxStream<'static, StorageChange> {
        self.state.changes.subscribe()
    }
}

#[async_trait]
impl StorageArea for MemoryStorageArea {
    fn area_id(&self) -> AreaId {
        self.area
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let entries = self
            .state
            .entries
            .lock()
            .map_err(|error| StorageError::Read {
                message: error.to_string(),
            })?;

        Ok(entries.get(&(self.area, key.to_string())).cloned())
    }

    /// Unchanged values are not re-announced.
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let old_value = {
            let mut entries = self
                .state
                .entries
                .lock()
                .map_err(|error| StorageError::Write {
                    message: error.to_string(),
                })?;
            entries.insert((self.area, key.to_string()), value.clone())
        };

        if old_value.as_ref() == Some(&value) {
            return Ok(());
        }

        self.state.changes.publish(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
            area: self.area,
        });

        Ok(())
    }
}
