use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info, warn};

use detour_core::{AreaId, ChangeFeed, StorageArea, StorageChange, StorageError};

use crate::ChangeBus;

type EntryKey = (AreaId, String);

struct SqliteState {
    connection: Mutex<Connection>,
    // Last known serialized value of every entry, used to diff external writes.
    snapshot: Mutex<HashMap<EntryKey, String>>,
    data_version: Mutex<i64>,
    changes: ChangeBus,
}

/// Key-value storage in a SQLite file.
///
/// Writes made through this handle are announced immediately. Writes made by
/// other processes on the same file are announced by
/// [`SqliteStorage::poll_external_changes`].
#[derive(Clone)]
pub struct SqliteStorage {
    state: Arc<SqliteState>,
}

pub struct SqliteStorageArea {
    area: AreaId,
    state: Arc<SqliteState>,
}

impl SqliteStorage {
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let connection = Connection::open(path).map_err(read_error)?;
        let storage = Self::from_connection(connection)?;
        info!(path = %path.display(), "sqlite storage opened");
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let connection = Connection::open_in_memory().map_err(read_error)?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, StorageError> {
        connection
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS entries (
                    area TEXT NOT NULL,
                    key TEXT NOT NULL,
                    value TEXT NOT NULL,
                    PRIMARY KEY (area, key)
                );",
            )
            .map_err(write_error)?;

        let data_version = read_data_version(&connection)?;
        let snapshot = read_all_entries(&connection)?;

        Ok(Self {
            state: Arc::new(SqliteState {
                connection: Mutex::new(connection),
                snapshot: Mutex::new(snapshot),
                data_version: Mutex::new(data_version),
                changes: ChangeBus::new(),
            }),
        })
    }

    pub fn area(&self, area: AreaId) -> SqliteStorageArea {
        SqliteStorageArea {
            area,
            state: Arc::clone(&self.state),
        }
    }

    /// Announces entries changed by other connections since the last poll.
    ///
    /// Returns the number of changes published.
    pub fn poll_external_changes(&self) -> Result<usize, StorageError> {
        let connection = self.state.connection.lock().map_err(read_error)?;

        let version = read_data_version(&connection)?;
        {
            let mut last_version = self.state.data_version.lock().map_err(read_error)?;
            if *last_version == version {
                return Ok(0);
            }
            *last_version = version;
        }

        let current = read_all_entries(&connection)?;
        drop(connection);

        let mut snapshot = self.state.snapshot.lock().map_err(read_error)?;
        let mut changes = Vec::new();

        for (entry, text) in &current {
            if snapshot.get(entry) == Some(text) {
                continue;
            }
            changes.push(StorageChange {
                key: entry.1.clone(),
                old_value: snapshot.get(entry).and_then(|old| decode(old)),
                new_value: decode(text),
                area: entry.0,
            });
        }

        for (entry, text) in snapshot.iter() {
            if !current.contains_key(entry) {
                changes.push(StorageChange {
                    key: entry.1.clone(),
                    old_value: decode(text),
                    new_value: None,
                    area: entry.0,
                });
            }
        }

        *snapshot = current;
        drop(snapshot);

        debug!(count = changes.len(), "external storage changes detected");
        let count = changes.len();
        for change in changes {
            self.state.changes.publish(change);
        }

        Ok(count)
    }
}

impl ChangeFeed for SqliteStorage {
    fn subscribe(&self) -> BoxStream<'static, StorageChange> {
        self.state.changes.subscribe()
    }
}

#[async_trait]
impl StorageArea for SqliteStorageArea {
    fn area_id(&self) -> AreaId {
        self.area
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let connection = self.state.connection.lock().map_err(read_error)?;

        let text: Option<String> = connection
            .query_row(
                "SELECT value FROM entries WHERE area = ?1 AND key = ?2",
                params![self.area.as_str(), key],
                |row| row.get(0),
            )
            .optional()
            .map_err(read_error)?;

        text.map(|text| {
            serde_json::from_str(&text).map_err(|error| StorageError::Read {
                message: error.to_string(),
            })
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(&value).map_err(|error| StorageError::Write {
            message: error.to_string(),
        })?;

        {
            let connection = self.state.connection.lock().map_err(write_error)?;
            connection
                .execute(
                    "INSERT INTO entries (area, key, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT (area, key) DO UPDATE SET value = excluded.value",
                    params![self.area.as_str(), key, text],
                )
                .map_err(write_error)?;
        }

        let old_text = self
            .state
            .snapshot
            .lock()
            .map_err(write_error)?
            .insert((self.area, key.to_string()), text.clone());

        if old_text.as_deref() == Some(text.as_str()) {
            return Ok(());
        }

        self.state.changes.publish(StorageChange {
            key: key.to_string(),
            old_value: old_text.as_deref().and_then(decode),
            new_value: Some(value),
            area: self.area,
        });

        Ok(())
    }
}

fn read_data_version(connection: &Connection) -> Result<i64, StorageError> {
    connection
        .query_row("PRAGMA data_version", [], |row| row.get(0))
        .map_err(read_error)
}

fn read_all_entries(connection: &Connection) -> Result<HashMap<EntryKey, String>, StorageError> {
    let mut statement = connection
        .prepare("SELECT area, key, value FROM entries")
        .map_err(read_error)?;

    let rows = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(read_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;

    let mut entries = HashMap::new();
    for (area, key, value) in rows {
        match AreaId::from_stored(&area) {
            Some(area) => {
                entries.insert((area, key), value);
            }
            None => warn!(%area, %key, "skipping entry in unknown storage area"),
        }
    }

    Ok(entries)
}

fn decode(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

fn read_error(error: impl ToString) -> StorageError {
    StorageError::Read {
        message: error.to_string(),
    }
}

fn write_error(error: impl ToString) -> StorageError {
    StorageError::Write {
        message: error.to_string(),
    }
}
