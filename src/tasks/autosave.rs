//! Periodic flush of dirty containers.
//!
//! The only path by which in-memory mutations made without an explicit
//! save reach disk.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::persistence::engine;
use crate::store::StoreContext;
use crate::tasks::TaskHandle;

/// Spawn the auto-save loop.
pub(crate) fn spawn(ctx: Arc<StoreContext>, interval: Duration) -> TaskHandle {
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the loop should wait a
        // full interval before its first pass.
        ticker.tick().await;

        tracing::info!(interval_ms = interval.as_millis() as u64, "auto-save loop started");
        loop {
            tokio::select! {
                _ = ticker.tick() => flush_dirty(&ctx).await,
                _ = shutdown_rx.recv() => {
                    tracing::debug!("auto-save loop shut down");
                    break;
                }
            }
        }
    });
    TaskHandle::new(shutdown_tx, join)
}

async fn flush_dirty(ctx: &StoreContext) {
    for container in ctx.registry.all() {
        if container.is_dirty() {
            tracing::debug!(
                path = %container.file_path().display(),
                "auto-saving dirty config"
            );
            let value = container.current();
            engine::flush(&container, &value).await;
        }
    }
}
