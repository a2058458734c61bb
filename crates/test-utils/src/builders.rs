#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use buildgate::config::{AppConfig, ConfigFile, ConfigSection, RawConfigFile};
use buildgate::types::Environment;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    base_dir: Option<std::path::PathBuf>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                app: BTreeMap::new(),
            },
            base_dir: None,
        }
    }

    pub fn with_app(mut self, name: &str, app: AppConfig) -> Self {
        self.config.app.insert(name.to_string(), app);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.config.environment = environment;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.config.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.config.poll_interval = interval;
        self
    }

    pub fn stop_grace_period(mut self, grace: Duration) -> Self {
        self.config.config.stop_grace_period = Some(grace);
        self
    }

    pub fn executable(mut self, executable: &str) -> Self {
        self.config.config.executable = executable.to_string();
        self
    }

    pub fn tee_output(mut self, val: bool) -> Self {
        self.config.config.tee_output = val;
        self
    }

    pub fn base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> ConfigFile {
        let cfg =
            ConfigFile::try_from(self.config).expect("Failed to build valid config from builder");
        match self.base_dir {
            Some(dir) => cfg.with_base_dir(dir),
            None => cfg,
        }
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `AppConfig`.
pub struct AppConfigBuilder {
    app: AppConfig,
}

impl AppConfigBuilder {
    pub fn new() -> Self {
        Self {
            app: AppConfig::default(),
        }
    }

    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.app.root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn output(mut self, output: impl AsRef<Path>) -> Self {
        self.app.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.app.timeout = Some(timeout);
        self
    }

    pub fn executable(mut self, executable: &str) -> Self {
        self.app.executable = Some(executable.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.app.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> AppConfig {
        self.app
    }
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
