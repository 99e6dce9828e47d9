//! Background loops: change watcher and auto-save.
//!
//! Each loop runs as an independent tokio task with its own broadcast
//! shutdown channel, so the watcher and the auto-save loop can be
//! cancelled separately; store teardown stops both.

pub mod autosave;
pub mod watcher;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Handle to one running background loop.
pub(crate) struct TaskHandle {
    shutdown: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub(crate) fn new(shutdown: broadcast::Sender<()>, join: JoinHandle<()>) -> Self {
        Self { shutdown, join }
    }

    /// Signal the loop to exit and wait for it to finish. Safe to call on
    /// a loop that already stopped on its own.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.join.await;
    }
}
