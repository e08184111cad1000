use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Logical storage area a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaId {
    /// Synchronized across devices. Preferred for rules and settings.
    Sync,
    /// Local to this device. Always used for metrics.
    Local,
}

impl AreaId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaId::Sync => "sync",
            AreaId::Local => "local",
        }
    }

    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "sync" => Some(AreaId::Sync),
            "local" => Some(AreaId::Local),
            _ => None,
        }
    }
}

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A change notification. Fired for writes from any process, this one included.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub area: AreaId,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage read failed: {message}")]
    Read { message: String },

    #[error("storage write failed: {message}")]
    Write { message: String },
}

#[async_trait]
pub trait StorageArea: Send + Sync {
    fn area_id(&self) -> AreaId;

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> BoxStream<'static, StorageChange>;
}
