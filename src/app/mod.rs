// src/app/mod.rs

//! A named front-end application and its build monitor.

pub mod paths;

pub use paths::PathSet;

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{AppConfig, ConfigFile};
use crate::errors::Result;
use crate::exec::{BuildBackend, ProcessSupervisor};
use crate::fs::FileSystem;
use crate::lock::LockProtocol;
use crate::monitor::BuildMonitor;
use crate::types::Environment;
use crate::wait::WaitOutcome;

/// One configured app. Immutable after construction apart from its monitor.
#[derive(Debug)]
pub struct App {
    paths: PathSet,
    environment: Environment,
    monitor: BuildMonitor,
    compiled: OnceCell<()>,
}

impl App {
    /// Build an app backed by the real build tool process.
    pub fn from_config(
        name: &str,
        app: &AppConfig,
        cfg: &ConfigFile,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let paths = PathSet::from_config(name, app, cfg);
        let supervisor = ProcessSupervisor::new(paths.clone(), cfg.config.environment, Arc::clone(&fs))
            .with_env(app.env.clone())
            .with_tee_output(cfg.config.tee_output)
            .with_grace_period(cfg.config.stop_grace_period);

        Self::with_backend(name, app, cfg, fs, Box::new(supervisor))
    }

    /// Build an app around any [`BuildBackend`].
    pub fn with_backend(
        name: &str,
        app: &AppConfig,
        cfg: &ConfigFile,
        fs: Arc<dyn FileSystem>,
        backend: Box<dyn BuildBackend>,
    ) -> Self {
        let paths = PathSet::from_config(name, app, cfg);
        let lock = LockProtocol::new(fs, paths.tmp());
        let monitor = BuildMonitor::new(
            name,
            lock,
            backend,
            app.effective_timeout(&cfg.config),
            cfg.config.poll_interval,
        );

        Self {
            paths,
            environment: cfg.config.environment,
            monitor,
            compiled: OnceCell::new(),
        }
    }

    /// Enable `notify` wakeups for readiness waits.
    pub fn with_change_notifications(mut self, enabled: bool) -> Self {
        self.monitor = self.monitor.with_change_notifications(enabled);
        self
    }

    pub fn name(&self) -> &str {
        self.paths.name()
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn root_path(&self) -> &std::path::Path {
        self.paths.root()
    }

    pub fn dist_path(&self) -> &std::path::Path {
        self.paths.dist()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn monitor(&self) -> &BuildMonitor {
        &self.monitor
    }

    /// One-shot build, at most once per process.
    ///
    /// Concurrent callers share the first attempt. A failed attempt is not
    /// memoized, so a later call builds again.
    pub async fn compile(&self) -> Result<()> {
        self.compiled
            .get_or_try_init(|| async {
                self.monitor.run_one_shot().await?;
                self.monitor.check()
            })
            .await?;
        Ok(())
    }

    /// Start the build the environment calls for, then wait for it.
    ///
    /// - development: watch mode
    /// - test / production: one-shot compile
    pub async fn build(&self) -> Result<WaitOutcome> {
        self.start().await?;
        self.monitor.wait().await
    }

    /// Start the build the environment calls for without waiting.
    pub async fn start(&self) -> Result<()> {
        if self.environment.watches() {
            info!(app = %self.name(), "starting watch-mode build");
            self.monitor.run_watch().await
        } else {
            self.compile().await
        }
    }

    pub fn check(&self) -> Result<()> {
        self.monitor.check()
    }

    pub async fn wait(&self) -> Result<WaitOutcome> {
        self.monitor.wait().await
    }

    pub async fn stop(&self) -> Result<()> {
        self.monitor.stop().await
    }
}
