use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::store::ScheduleStore;

/// Background task that periodically drops lookups cached under old schedule versions.
pub async fn run_pruner(store: Arc<ScheduleStore>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let removed = store.prune_cache();
        if removed > 0 {
            debug!("pruned {removed} stale lookup(s) at version {}", store.version());
        }
    }
}
