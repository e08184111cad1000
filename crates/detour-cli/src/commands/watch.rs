use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use detour_adapters::SqliteStorage;
use detour_core::{ChangeFeed, ConfigStore};
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::stats;

/// Re-renders stats whenever metrics or settings change, until Ctrl-C.
pub async fn execute(
    storage: &SqliteStorage,
    store: ConfigStore,
    poll_interval: Duration,
) -> Result<()> {
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("SIGINT received, stopping watch");
    };

    run(storage, store, poll_interval, shutdown).await;
    Ok(())
}

/// Runs until `shutdown` resolves or the change feed closes.
async fn run(
    storage: &SqliteStorage,
    mut store: ConfigStore,
    poll_interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> ConfigStore {
    let mut changes = storage.subscribe();
    let mut poll = tokio::time::interval(poll_interval);
    tokio::pin!(shutdown);

    render(&store);
    info!(interval_ms = poll_interval.as_millis() as u64, "watching storage");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = poll.tick() => {
                if let Err(error) = storage.poll_external_changes() {
                    warn!(%error, "failed to poll storage changes");
                }
            }
            change = changes.next() => {
                let Some(change) = change else {
                    break;
                };
                if let Some(reconciled) = store.handle_change(&change) {
                    debug!(?reconciled, key = %change.key, "store reconciled");
                    render(&store);
                }
            }
        }
    }

    store
}

fn render(store: &ConfigStore) {
    println!("[{}]", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("{}", stats::render(store));
}
