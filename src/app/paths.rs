// src/app/paths.rs

//! Per-app path computation.

use std::path::{Path, PathBuf};

use crate::config::{AppConfig, ConfigFile};
use crate::errors::{BuildgateError, Result};
use crate::fs::FileSystem;
use crate::lock::{ERROR_FILE_NAME, LOCK_FILE_NAME};
use crate::types::Environment;

/// Every path an app's build touches.
///
/// | path        | default                                   |
/// |-------------|-------------------------------------------|
/// | `root`      | `<base>/<name>`                           |
/// | `tmp`       | `<root>/tmp`                              |
/// | `dist`      | `<base>/<tmp_root>/apps/<name>`           |
/// | `log`       | `<base>/<log_dir>/buildgate-<name>.<env>.log` |
///
/// The lock and error files live in `tmp` rather than `dist` because build
/// tools commonly wipe their output directory at the start of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    name: String,
    root: PathBuf,
    tmp: PathBuf,
    dist: PathBuf,
    log: PathBuf,
    executable: String,
}

impl PathSet {
    pub fn from_config(name: &str, app: &AppConfig, cfg: &ConfigFile) -> Self {
        let environment = cfg.config.environment;
        let root = match &app.root {
            Some(root) => cfg.resolve(root),
            None => cfg.resolve(name),
        };
        let dist = match &app.output {
            Some(output) => cfg.resolve(output),
            None => cfg.resolve(cfg.config.tmp_root.join("apps").join(name)),
        };
        let log = cfg
            .resolve(&cfg.config.log_dir)
            .join(log_file_name(name, environment));

        Self {
            name: name.to_string(),
            tmp: root.join("tmp"),
            root,
            dist,
            log,
            executable: app.effective_executable(&cfg.config).to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tmp(&self) -> &Path {
        &self.tmp
    }

    pub fn lockfile(&self) -> PathBuf {
        self.tmp.join(LOCK_FILE_NAME)
    }

    pub fn build_error_file(&self) -> PathBuf {
        self.tmp.join(ERROR_FILE_NAME)
    }

    pub fn dist(&self) -> &Path {
        &self.dist
    }

    pub fn log(&self) -> &Path {
        &self.log
    }

    /// Resolve and validate the build tool executable.
    ///
    /// Names containing a path separator are resolved against `root`; bare
    /// names are looked up on `PATH`.
    pub fn executable(&self, fs: &dyn FileSystem) -> Result<PathBuf> {
        let configured = Path::new(&self.executable);

        if configured.components().count() == 1 && !configured.is_absolute() {
            return which::which(configured).map_err(|e| {
                BuildgateError::Dependency(format!(
                    "build tool '{}' for app '{}' not found on PATH: {}",
                    self.executable, self.name, e
                ))
            });
        }

        let path = if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.root.join(configured)
        };

        if !fs.is_executable(&path) {
            return Err(BuildgateError::Dependency(format!(
                "build tool for app '{}' is missing or not executable at {:?}; \
                 install the app's dependencies first",
                self.name, path
            )));
        }
        Ok(path)
    }

    /// Create the directories the build writes into.
    pub fn ensure_dirs(&self, fs: &dyn FileSystem) -> Result<()> {
        fs.create_dir_all(&self.tmp)?;
        fs.create_dir_all(&self.dist)?;
        if let Some(parent) = self.log.parent() {
            fs.create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn log_file_name(name: &str, environment: Environment) -> String {
    format!("buildgate-{}.{}.log", name, environment)
}
