// src/monitor/build_monitor.rs

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{BuildgateError, Result};
use crate::exec::{BuildBackend, RunReport};
use crate::lock::LockProtocol;
use crate::types::BuildOutcome;
use crate::wait::{ReadinessWaiter, WaitOutcome};

use super::state::{MonitorCore, MonitorState};

/// Per-app façade over the lock protocol, the build backend and the
/// readiness waiter.
///
/// All methods take `&self`; the monitor is meant to be shared by every
/// request handler of the host process.
pub struct BuildMonitor {
    name: String,
    lock: LockProtocol,
    waiter: ReadinessWaiter,
    backend: Box<dyn BuildBackend>,
    timeout: Duration,
    core: Mutex<MonitorCore>,
    /// Serializes reset + start within this process.
    build_guard: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for BuildMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildMonitor")
            .field("name", &self.name)
            .field("lock", &self.lock)
            .field("timeout", &self.timeout)
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl BuildMonitor {
    pub fn new(
        name: impl Into<String>,
        lock: LockProtocol,
        backend: Box<dyn BuildBackend>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        let name = name.into();
        let waiter = ReadinessWaiter::new(name.clone(), lock.clone(), poll_interval);
        Self {
            name,
            lock,
            waiter,
            backend,
            timeout,
            core: Mutex::new(MonitorCore::new()),
            build_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// See [`ReadinessWaiter::with_change_notifications`].
    pub fn with_change_notifications(mut self, enabled: bool) -> Self {
        self.waiter = self.waiter.with_change_notifications(enabled);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn lock(&self) -> &LockProtocol {
        &self.lock
    }

    pub fn state(&self) -> MonitorState {
        self.core().state()
    }

    /// Outcome as recorded on disk (shared with other host processes).
    pub fn outcome(&self) -> BuildOutcome {
        self.lock.outcome()
    }

    /// Number of readiness waits that gave up on their timeout.
    pub fn timeouts(&self) -> usize {
        self.waiter.timeouts()
    }

    pub fn is_running(&self) -> bool {
        self.backend.is_running()
    }

    fn core(&self) -> MutexGuard<'_, MonitorCore> {
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Clear the error file, create the lock file, enter `Preparing`.
    pub fn reset(&self) -> Result<()> {
        self.lock.reset()?;
        self.core().prepare();
        debug!(app = %self.name, "build state reset");
        Ok(())
    }

    /// Reset unless already `Preparing`, then enter `Building`.
    ///
    /// Callers validate the tool first: a missing tool must never leave a
    /// lock behind.
    fn begin_build(&self) -> Result<()> {
        if self.state() != MonitorState::Preparing {
            self.reset()?;
        }
        self.core().start_build();
        Ok(())
    }

    /// Run the tool once and block until it exits.
    ///
    /// Fails with `Build` if the tool wrote an error file or exited
    /// non-zero; either way the monitor stays `Failed` until the next reset.
    pub async fn run_one_shot(&self) -> Result<()> {
        let _guard = self.build_guard.lock().await;
        self.backend.validate()?;
        self.begin_build()?;

        let report = match self.backend.run_once().await {
            Ok(report) => report,
            Err(e) => {
                self.core().fail(Some(format!("build tool could not be run: {e}")));
                return Err(e);
            }
        };

        self.finish_one_shot(report)
    }

    fn finish_one_shot(&self, report: RunReport) -> Result<()> {
        if self.lock.has_error() {
            let msg = self.lock.read_error()?;
            self.core().fail(None);
            warn!(app = %self.name, exit_code = ?report.exit_code, "build failed");
            return Err(BuildgateError::Build(msg));
        }

        if !report.success {
            let detail = anomaly_message(&self.name, &report);
            warn!(app = %self.name, exit_code = ?report.exit_code, "build tool failed without an error file");
            self.core().fail(Some(detail.clone()));
            return Err(BuildgateError::Build(detail));
        }

        if self.lock.is_locked() {
            warn!(
                app = %self.name,
                lockfile = ?self.lock.lockfile(),
                "build tool exited successfully but left the lock file in place; waits will time out"
            );
        }

        self.core().complete();
        info!(app = %self.name, "build complete");
        Ok(())
    }

    /// Start the tool in watch mode and return once it is spawned.
    ///
    /// Callers use [`wait`](Self::wait) for the first build to finish.
    pub async fn run_watch(&self) -> Result<()> {
        let _guard = self.build_guard.lock().await;
        self.backend.validate()?;

        // A previous watcher could still release the fresh lock or write an
        // error file, so it has to be gone before the reset.
        if self.backend.is_running() {
            info!(app = %self.name, "stopping previous watch-mode build");
            self.backend.stop().await?;
        }
        self.begin_build()?;

        if let Err(e) = self.backend.spawn_watch().await {
            self.core().fail(Some(format!("build tool could not be started: {e}")));
            return Err(e);
        }
        Ok(())
    }

    /// `Err(Build)` if the last build failed; no-op otherwise.
    pub fn check(&self) -> Result<()> {
        if self.lock.has_error() {
            let msg = self.lock.read_error()?;
            self.core().fail(None);
            return Err(BuildgateError::Build(msg));
        }
        if let Some(detail) = self.core().failure() {
            return Err(BuildgateError::Build(detail.to_string()));
        }
        Ok(())
    }

    /// Wait up to the app's timeout for the build to finish.
    pub async fn wait(&self) -> Result<WaitOutcome> {
        self.wait_for(self.timeout).await
    }

    /// Wait up to `timeout` for the build to finish.
    pub async fn wait_for(&self, timeout: Duration) -> Result<WaitOutcome> {
        self.check()?;

        match self.waiter.wait(timeout).await {
            Ok(outcome) => {
                if outcome.is_ready() {
                    self.core().complete();
                }
                Ok(outcome)
            }
            Err(e) => {
                if e.is_build_failure() {
                    self.core().fail(None);
                }
                Err(e)
            }
        }
    }

    /// Stop a watch-mode tool. No-op when nothing is running.
    pub async fn stop(&self) -> Result<()> {
        self.backend.stop().await
    }
}

fn anomaly_message(app: &str, report: &RunReport) -> String {
    let status = match report.exit_code {
        Some(code) => format!("exit status {code}"),
        None => "a signal".to_string(),
    };
    let mut msg = format!(
        "build tool for app '{app}' terminated with {status} without writing an error file"
    );
    if !report.output_tail.is_empty() {
        msg.push_str("; last output:\n");
        msg.push_str(&report.output_tail.join("\n"));
    }
    msg
}
