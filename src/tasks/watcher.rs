//! Filesystem change watcher for hot reload.
//!
//! One `notify` subscription per distinct parent directory of the managed
//! files. Change notifications are forwarded into an async loop which
//! debounces, matches the path back to its container, and runs a targeted
//! reload. The mtime/size pre-check in the orchestrator absorbs duplicate
//! OS events and the store's own writes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::store::orchestrator;
use crate::store::StoreContext;
use crate::tasks::TaskHandle;

enum WatchSignal {
    Changed(PathBuf),
    /// The notification backend failed; the loop logs and terminates for
    /// this generation. Re-enabling the watcher starts a fresh one.
    Failed(String),
}

/// Subscribe to all watch directories and spawn the reload loop.
pub(crate) fn spawn(
    ctx: Arc<StoreContext>,
    debounce: Duration,
) -> Result<TaskHandle, notify::Error> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let event_tx = tx.clone();
    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if event.kind.is_modify() || event.kind.is_create() {
                    for path in event.paths {
                        let _ = event_tx.send(WatchSignal::Changed(path));
                    }
                }
            }
            Err(error) => {
                let _ = event_tx.send(WatchSignal::Failed(error.to_string()));
            }
        },
        Config::default(),
    )?;

    let dirs = ctx.registry.watch_dirs();
    for dir in &dirs {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }
    tracing::info!(dirs = dirs.len(), "config watcher started");

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        // The subscription lives exactly as long as this task.
        let _watcher = watcher;
        loop {
            tokio::select! {
                signal = rx.recv() => match signal {
                    Some(WatchSignal::Changed(path)) => {
                        let Some(container) = ctx.registry.by_path(&path) else {
                            continue;
                        };
                        // Coalesce the burst of OS-level events for one
                        // logical edit.
                        tokio::time::sleep(debounce).await;
                        orchestrator::reload(&ctx, &container).await;
                    }
                    Some(WatchSignal::Failed(error)) => {
                        tracing::error!(%error, "config watcher stopped");
                        break;
                    }
                    None => break,
                },
                _ = shutdown_rx.recv() => {
                    tracing::debug!("config watcher shut down");
                    break;
                }
            }
        }
    });

    Ok(TaskHandle::new(shutdown_tx, join))
}
