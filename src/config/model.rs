// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::Environment;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [config]
/// environment = "development"
/// timeout = "5s"
///
/// [app.blog]
/// root = "frontend/blog"
/// output = "public/blog"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All apps from `[app.<name>]`, keyed by app name.
    #[serde(default)]
    pub app: BTreeMap<String, AppConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (or the
/// loader), so holders can rely on the checks in `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub app: BTreeMap<String, AppConfig>,
    /// Directory relative paths are resolved against (the config file's
    /// directory when loaded from disk).
    pub base_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, app: BTreeMap<String, AppConfig>) -> Self {
        Self {
            config,
            app,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Resolve `path` against `base_dir` unless it is already absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// `[config]` section: process-wide defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default)]
    pub environment: Environment,

    /// Default readiness timeout for `wait`.
    #[serde(default = "default_timeout", deserialize_with = "super::duration::deserialize")]
    pub timeout: Duration,

    /// How often the readiness waiter re-checks the lock/error files.
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "super::duration::deserialize"
    )]
    pub poll_interval: Duration,

    /// How long `stop` waits after SIGINT before killing the tool.
    ///
    /// `None` means never escalate.
    #[serde(default, deserialize_with = "super::duration::deserialize_opt")]
    pub stop_grace_period: Option<Duration>,

    /// Build tool executable: a path relative to the app root, or a bare
    /// name looked up on `PATH`.
    #[serde(default = "default_executable")]
    pub executable: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Append build tool output to the per-app log file.
    #[serde(default = "default_tee_output")]
    pub tee_output: bool,

    /// Parent of the default output directories (`<tmp_root>/apps/<name>`).
    #[serde(default = "default_tmp_root")]
    pub tmp_root: PathBuf,
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_executable() -> String {
    "node_modules/.bin/ember".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

fn default_tee_output() -> bool {
    true
}

fn default_tmp_root() -> PathBuf {
    PathBuf::from("tmp/buildgate")
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            stop_grace_period: None,
            executable: default_executable(),
            log_dir: default_log_dir(),
            tee_output: default_tee_output(),
            tmp_root: default_tmp_root(),
        }
    }
}

/// `[app.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Source tree; defaults to `<base_dir>/<name>`.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Build output directory; defaults to `<tmp_root>/apps/<name>`.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Per-app readiness timeout; falls back to `[config].timeout`.
    #[serde(default, deserialize_with = "super::duration::deserialize_opt")]
    pub timeout: Option<Duration>,

    /// Per-app executable; falls back to `[config].executable`.
    #[serde(default)]
    pub executable: Option<String>,

    /// Extra environment variables for the build tool process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl AppConfig {
    pub fn effective_timeout(&self, global: &ConfigSection) -> Duration {
        self.timeout.unwrap_or(global.timeout)
    }

    pub fn effective_executable<'a>(&'a self, global: &'a ConfigSection) -> &'a str {
        self.executable.as_deref().unwrap_or(&global.executable)
    }
}
