// src/wait/watcher.rs

use std::path::Path;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

/// Change notifications for an app's tmp directory.
///
/// Only used to wake the readiness waiter early; the waiter still re-checks
/// the lock/error files itself, so a missed or spurious event is harmless.
/// Dropping this handle stops watching.
pub struct LockDirWatcher {
    _inner: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<()>,
}

impl std::fmt::Debug for LockDirWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockDirWatcher").finish()
    }
}

impl LockDirWatcher {
    /// Start watching `dir` (non-recursively).
    pub fn spawn(dir: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<()>();

        // Called synchronously by notify on its own thread.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(_) => {
                    let _ = tx.send(());
                }
                Err(err) => {
                    debug!(error = %err, "lock dir watch error");
                }
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        debug!(dir = ?dir, "watching lock dir for changes");

        Ok(Self {
            _inner: watcher,
            rx,
        })
    }

    /// Wait for the next change, coalescing any queued ones.
    ///
    /// Returns `false` once the underlying watcher has gone away.
    pub async fn changed(&mut self) -> bool {
        if self.rx.recv().await.is_none() {
            return false;
        }
        while self.rx.try_recv().is_ok() {}
        true
    }
}
