// src/wait/waiter.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::errors::{BuildgateError, Result};
use crate::lock::LockProtocol;

use super::watcher::LockDirWatcher;

/// How a readiness wait ended without a build failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The lock file is gone and no error was reported.
    Ready { waited: Duration },
    /// The lock was still held when the timeout expired. The caller carries
    /// on, possibly serving an in-progress build.
    TimedOut { waited: Duration },
}

impl WaitOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready { .. })
    }
}

/// Bounded wait for an app's build to reach a terminal state.
///
/// Every check is a read-only filesystem probe, so any number of callers
/// (and host processes) may wait on the same app concurrently.
#[derive(Debug)]
pub struct ReadinessWaiter {
    app: String,
    lock: LockProtocol,
    poll_interval: Duration,
    change_notifications: bool,
    timeouts: AtomicUsize,
    watch_attempts: AtomicUsize,
}

impl ReadinessWaiter {
    pub fn new(app: impl Into<String>, lock: LockProtocol, poll_interval: Duration) -> Self {
        Self {
            app: app.into(),
            lock,
            poll_interval,
            change_notifications: false,
            timeouts: AtomicUsize::new(0),
            watch_attempts: AtomicUsize::new(0),
        }
    }

    /// Wake early on filesystem changes in the lock dir instead of only on
    /// the poll interval. Detection semantics are unchanged.
    pub fn with_change_notifications(mut self, enabled: bool) -> Self {
        self.change_notifications = enabled;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Number of waits that ended in [`WaitOutcome::TimedOut`].
    pub fn timeouts(&self) -> usize {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Number of times a lock dir watcher was set up.
    pub fn watch_attempts(&self) -> usize {
        self.watch_attempts.load(Ordering::Relaxed)
    }

    /// Block until the build succeeds, fails, or `timeout` expires.
    ///
    /// - error file present → `Err(BuildgateError::Build)` with its contents
    /// - lock file absent → `Ok(Ready)`
    /// - timeout → `Ok(TimedOut)` and a single warning
    ///
    /// State is checked before the deadline, so a zero timeout still
    /// reports a finished build.
    pub async fn wait(&self, timeout: Duration) -> Result<WaitOutcome> {
        let started = Instant::now();
        // Only set up once the build is known to still be running; most
        // waits on a finished build return on the first check.
        let mut changes: Option<LockDirWatcher> = None;
        let mut watch_requested = false;

        loop {
            if self.lock.has_error() {
                match self.lock.read_error() {
                    Ok(msg) => {
                        debug!(app = %self.app, "build reported failure");
                        return Err(BuildgateError::Build(msg));
                    }
                    // Cleared by a concurrent reset between the two probes.
                    Err(BuildgateError::ErrorFileNotFound(_)) => continue,
                    Err(e) => return Err(e),
                }
            }

            let waited = started.elapsed();
            if !self.lock.is_locked() {
                debug!(app = %self.app, waited_ms = waited.as_millis() as u64, "build ready");
                return Ok(WaitOutcome::Ready { waited });
            }

            if waited >= timeout {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    app = %self.app,
                    timeout_ms = timeout.as_millis() as u64,
                    lockfile = ?self.lock.lockfile(),
                    "build still running after the readiness timeout; continuing without it. \
                     Consider raising `timeout` for this app"
                );
                return Ok(WaitOutcome::TimedOut { waited });
            }

            if !watch_requested {
                watch_requested = true;
                changes = self.watch_changes();
            }

            let nap = self.poll_interval.min(timeout - waited);
            match changes.as_mut() {
                Some(watcher) => {
                    tokio::select! {
                        _ = sleep(nap) => {}
                        alive = watcher.changed() => {
                            if !alive {
                                changes = None;
                            }
                        }
                    }
                }
                None => sleep(nap).await,
            }
        }
    }

    fn watch_changes(&self) -> Option<LockDirWatcher> {
        if !self.change_notifications {
            return None;
        }
        self.watch_attempts.fetch_add(1, Ordering::Relaxed);
        match LockDirWatcher::spawn(self.lock.tmp_dir()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                debug!(app = %self.app, error = %e, "lock dir watch unavailable; polling only");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fs::RealFileSystem;
    use crate::fs::mock::MockFileSystem;

    const TMP: &str = "/apps/blog/tmp";

    fn waiter(fs: &MockFileSystem) -> ReadinessWaiter {
        let lock = LockProtocol::new(Arc::new(fs.clone()), TMP);
        ReadinessWaiter::new("blog", lock, Duration::from_millis(100))
    }

    #[tokio::test]
    async fn never_started_build_is_ready_immediately() {
        let fs = MockFileSystem::new();
        let outcome = waiter(&fs).wait(Duration::ZERO).await.unwrap();
        assert!(outcome.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn lock_removal_ends_the_wait() {
        let fs = MockFileSystem::new();
        let w = waiter(&fs);
        w.lock.reset().unwrap();

        let tool = fs.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            tool.remove("/apps/blog/tmp/build.lock");
        });

        let outcome = w.wait(Duration::from_secs(5)).await.unwrap();
        match outcome {
            WaitOutcome::Ready { waited } => assert!(waited < Duration::from_secs(1)),
            other => panic!("expected Ready, got {other:?}"),
        }
        assert_eq!(w.timeouts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn error_file_fails_without_waiting_out_the_timeout() {
        let fs = MockFileSystem::new();
        let w = waiter(&fs);
        w.lock.reset().unwrap();
        fs.add_file("/apps/blog/tmp/error.txt", "SyntaxError: unexpected token");

        let started = Instant::now();
        let err = w.wait(Duration::from_secs(60)).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(1));
        match err {
            BuildgateError::Build(msg) => assert_eq!(msg, "SyntaxError: unexpected token"),
            other => panic!("expected Build error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn held_lock_times_out_without_error() {
        let fs = MockFileSystem::new();
        let w = waiter(&fs);
        w.lock.reset().unwrap();

        let outcome = w.wait(Duration::from_secs(1)).await.unwrap();
        match outcome {
            WaitOutcome::TimedOut { waited } => {
                assert!(waited >= Duration::from_secs(1));
                assert!(waited < Duration::from_millis(1200));
            }
            other => panic!("expected TimedOut, got {other:?}"),
        }
        assert_eq!(w.timeouts(), 1);

        // Repeated waits behave the same and warn once each.
        let again = w.wait(Duration::from_secs(1)).await.unwrap();
        assert!(!again.is_ready());
        assert_eq!(w.timeouts(), 2);
    }

    #[tokio::test]
    async fn watcher_is_only_started_for_a_held_lock() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LockProtocol::new(Arc::new(RealFileSystem), dir.path().join("tmp"));
        let w = ReadinessWaiter::new("blog", lock, Duration::from_millis(10))
            .with_change_notifications(true);

        assert!(w.wait(Duration::from_secs(1)).await.unwrap().is_ready());
        assert!(w.wait(Duration::ZERO).await.unwrap().is_ready());
        assert_eq!(w.watch_attempts(), 0);

        w.lock.reset().unwrap();
        let outcome = w.wait(Duration::from_millis(50)).await.unwrap();
        assert!(!outcome.is_ready());
        assert_eq!(w.watch_attempts(), 1);
    }
}
