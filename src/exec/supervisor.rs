// src/exec/supervisor.rs

//! Owns the build tool subprocess for one app.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::app::PathSet;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::{BuildMode, Environment};

use super::backend::{BackendFuture, BuildBackend, RunReport};
use super::command::BuildCommand;
use super::output::OutputCapture;

/// Starts, tracks and stops the build tool for a single app.
///
/// - One-shot builds are awaited to completion and never tracked.
/// - At most one watch-mode child is tracked at a time; starting a new one
///   stops the previous instance first.
/// - `stop` is two-phase: SIGINT first, then a hard kill if the child is
///   still alive after the grace period (if one is configured).
#[derive(Debug)]
pub struct ProcessSupervisor {
    paths: PathSet,
    environment: Environment,
    env: BTreeMap<String, String>,
    fs: Arc<dyn FileSystem>,
    tee_output: bool,
    grace_period: Option<Duration>,
    child: Mutex<Option<Child>>,
}

impl ProcessSupervisor {
    pub fn new(paths: PathSet, environment: Environment, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            paths,
            environment,
            env: BTreeMap::new(),
            fs,
            tee_output: false,
            grace_period: None,
            child: Mutex::new(None),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_tee_output(mut self, tee_output: bool) -> Self {
        self.tee_output = tee_output;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Option<Duration>) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn app(&self) -> &str {
        self.paths.name()
    }

    /// PID of the tracked watch-mode process, if any.
    pub fn tracked_pid(&self) -> Option<u32> {
        self.slot().as_ref().and_then(|c| c.id())
    }

    /// Resolve the executable and assemble the invocation.
    pub fn build_command(&self) -> Result<BuildCommand> {
        Ok(BuildCommand {
            executable: self.paths.executable(self.fs.as_ref())?,
            cwd: self.paths.root().to_path_buf(),
            environment: self.environment,
            output_path: self.paths.dist().to_path_buf(),
            lockfile: self.paths.lockfile(),
            error_file: self.paths.build_error_file(),
            env: self.env.clone(),
        })
    }

    fn slot(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log_path(&self) -> Option<std::path::PathBuf> {
        self.tee_output.then(|| self.paths.log().to_path_buf())
    }

    fn spawn(&self, mode: BuildMode) -> Result<(Child, OutputCapture)> {
        let command = self.build_command()?;
        self.paths.ensure_dirs(self.fs.as_ref())?;

        info!(
            app = %self.app(),
            mode = ?mode,
            cmd = %command.display(mode),
            "starting build tool"
        );

        let mut child = command
            .to_command(mode)
            .spawn()
            .with_context(|| format!("spawning build tool for app '{}'", self.app()))?;
        let capture = OutputCapture::attach(&mut child, self.app(), self.log_path());

        Ok((child, capture))
    }

    /// Run the tool once, blocking until it exits.
    pub async fn run_once(&self) -> Result<RunReport> {
        let (mut child, capture) = self.spawn(BuildMode::OneShot)?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for build tool of app '{}'", self.app()))?;
        let output_tail = capture.finish().await;

        let report = RunReport {
            exit_code: status.code(),
            success: status.success(),
            output_tail,
        };

        info!(
            app = %self.app(),
            exit_code = ?report.exit_code,
            success = report.success,
            "build tool exited"
        );

        Ok(report)
    }

    /// Spawn the tool in watch mode and track it.
    pub async fn spawn_watch(&self) -> Result<()> {
        // Never run two watchers for the same output directory.
        self.stop().await?;

        let (child, _capture) = self.spawn(BuildMode::Watch)?;
        info!(app = %self.app(), pid = ?child.id(), "build tool watching");

        *self.slot() = Some(child);
        Ok(())
    }

    /// Stop the tracked watch process, if any.
    pub async fn stop(&self) -> Result<()> {
        let tracked = self.slot().take();
        let Some(mut child) = tracked else {
            debug!(app = %self.app(), "no tracked build process; nothing to stop");
            return Ok(());
        };

        let pid = child.id();
        info!(app = %self.app(), pid = ?pid, "interrupting build tool");

        if let Err(e) = interrupt(&mut child) {
            warn!(app = %self.app(), pid = ?pid, error = %e, "failed to deliver interrupt");
        }

        match self.grace_period {
            Some(grace) => match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(app = %self.app(), exit_code = ?status.code(), "build tool stopped");
                }
                Ok(Err(e)) => {
                    warn!(app = %self.app(), error = %e, "waiting for build tool to stop failed");
                }
                Err(_) => {
                    warn!(
                        app = %self.app(),
                        pid = ?pid,
                        grace_ms = grace.as_millis() as u64,
                        "build tool ignored interrupt; killing"
                    );
                    child
                        .kill()
                        .await
                        .with_context(|| format!("killing build tool of app '{}'", self.app()))?;
                }
            },
            None => {
                // Reap in the background so the interrupted tool can flush.
                let app = self.app().to_string();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) => debug!(app = %app, exit_code = ?status.code(), "build tool reaped"),
                        Err(e) => debug!(app = %app, error = %e, "reaping build tool failed"),
                    }
                });
            }
        }

        Ok(())
    }
}

#[cfg(unix)]
fn interrupt(child: &mut Child) -> anyhow::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // No id means the child has already been reaped.
    if let Some(id) = child.id() {
        let pid = i32::try_from(id).context("pid out of range")?;
        kill(Pid::from_raw(pid), Signal::SIGINT).context("sending SIGINT")?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) -> anyhow::Result<()> {
    child.start_kill().context("terminating build tool")
}

impl BuildBackend for ProcessSupervisor {
    fn validate(&self) -> Result<()> {
        self.paths.executable(self.fs.as_ref()).map(|_| ())
    }

    fn run_once(&self) -> BackendFuture<'_, RunReport> {
        Box::pin(ProcessSupervisor::run_once(self))
    }

    fn spawn_watch(&self) -> BackendFuture<'_, ()> {
        Box::pin(ProcessSupervisor::spawn_watch(self))
    }

    fn stop(&self) -> BackendFuture<'_, ()> {
        Box::pin(ProcessSupervisor::stop(self))
    }

    fn is_running(&self) -> bool {
        match self.slot().as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}
