mod rate;
mod rules;
mod stats;
mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use detour_adapters::SqliteStorage;
use detour_core::{AreaId, Config, ConfigStore, StorageArea, StorageAreas};

pub use rate::execute as rate;
pub use rules::{add as add_rule, delete as delete_rule, edit as edit_rule, list as list_rules};
pub use rules::set_enabled as set_rule_enabled;
pub use stats::execute as stats;
pub use watch::execute as watch;

/// Opens the storage file and loads a store on it.
///
/// The returned storage handle is kept for change polling.
pub async fn open_store(config: &Config) -> Result<(SqliteStorage, ConfigStore)> {
    let database_path = config.storage.database_path();

    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create data directory {}", parent.display()))?;
    }

    let storage = SqliteStorage::new(&database_path).context("database access error")?;

    let local: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Local));
    let sync: Option<Arc<dyn StorageArea>> = if config.storage.sync_enabled {
        let area: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Sync));
        Some(area)
    } else {
        None
    };

    let store = ConfigStore::open(StorageAreas::resolve(sync, local)).await;
    Ok((storage, store))
}
