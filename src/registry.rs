// src/registry.rs

//! Explicit context object holding every configured app.
//!
//! Built once at startup and passed to whatever needs to resolve an app by
//! name; there is no process-wide registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::app::App;
use crate::config::ConfigFile;
use crate::errors::{BuildgateError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::monitor::MonitorState;
use crate::types::{BuildOutcome, Environment};
use crate::wait::WaitOutcome;

/// Status line for one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStatus {
    pub name: String,
    pub outcome: BuildOutcome,
    pub state: MonitorState,
    pub running: bool,
}

#[derive(Debug)]
pub struct AppRegistry {
    environment: Environment,
    apps: BTreeMap<String, App>,
    launched: OnceCell<()>,
}

impl AppRegistry {
    /// Apps backed by the real filesystem and real build tool processes.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let apps = cfg
            .app
            .iter()
            .map(|(name, app)| {
                App::from_config(name, app, cfg, Arc::clone(&fs)).with_change_notifications(true)
            })
            .collect();
        Self::from_apps(cfg.config.environment, apps)
    }

    pub fn from_apps(environment: Environment, apps: Vec<App>) -> Self {
        let apps = apps
            .into_iter()
            .map(|app| (app.name().to_string(), app))
            .collect();
        Self {
            environment,
            apps,
            launched: OnceCell::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn get(&self, name: &str) -> Result<&App> {
        self.apps
            .get(name)
            .ok_or_else(|| BuildgateError::UnknownApp(name.to_string()))
    }

    pub fn apps(&self) -> impl Iterator<Item = &App> {
        self.apps.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(|s| s.as_str())
    }

    /// All apps, or just the named one.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<&App>> {
        match name {
            Some(name) => Ok(vec![self.get(name)?]),
            None => Ok(self.apps().collect()),
        }
    }

    /// One-shot build of every app, stopping at the first failure.
    pub async fn compile_all(&self) -> Result<()> {
        for app in self.apps() {
            app.compile().await?;
        }
        Ok(())
    }

    /// Start every app's build (watch or compile, per environment).
    pub async fn start_all(&self) -> Result<()> {
        for app in self.apps() {
            app.start().await?;
        }
        Ok(())
    }

    /// Start every build, then wait for all of them.
    pub async fn build_all(&self) -> Result<Vec<(String, WaitOutcome)>> {
        self.start_all().await?;
        self.wait_all().await
    }

    /// Wait for every app in turn; the first build failure aborts.
    pub async fn wait_all(&self) -> Result<Vec<(String, WaitOutcome)>> {
        let mut outcomes = Vec::with_capacity(self.apps.len());
        for app in self.apps() {
            let outcome = app.wait().await?;
            outcomes.push((app.name().to_string(), outcome));
        }
        Ok(outcomes)
    }

    pub fn check_all(&self) -> Result<()> {
        for app in self.apps() {
            app.check()?;
        }
        Ok(())
    }

    /// Stop every watch-mode tool. Attempts all apps; returns the first error.
    pub async fn stop_all(&self) -> Result<()> {
        let mut first_err = None;
        for app in self.apps() {
            if let Err(e) = app.stop().await {
                warn!(app = %app.name(), error = %e, "failed to stop build tool");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Request gate for host request handlers.
    ///
    /// The first caller launches every build (watch mode in development,
    /// one-shot compile otherwise); every caller then waits for readiness.
    /// A failed launch is retried by the next caller.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.launched
            .get_or_try_init(|| async {
                info!(environment = %self.environment, "launching builds");
                self.start_all().await
            })
            .await?;

        self.wait_all().await?;
        Ok(())
    }

    pub fn status(&self) -> Vec<AppStatus> {
        self.apps()
            .map(|app| AppStatus {
                name: app.name().to_string(),
                outcome: app.monitor().outcome(),
                state: app.monitor().state(),
                running: app.monitor().is_running(),
            })
            .collect()
    }
}
