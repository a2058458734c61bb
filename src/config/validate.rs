// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildgateError, Result};

/// App names end up in file names (`buildgate-<name>.<env>.log`,
/// `<tmp_root>/apps/<name>`), so keep them to a safe character set.
const APP_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.-]*$";

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildgateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.app))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_apps(cfg)?;
    validate_global_config(cfg)?;
    validate_app_names(cfg)?;
    validate_executables(cfg)?;
    Ok(())
}

fn ensure_has_apps(cfg: &RawConfigFile) -> Result<()> {
    if cfg.app.is_empty() {
        return Err(BuildgateError::ConfigError(
            "config must contain at least one [app.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // Durations are parsed during deserialization; only semantic checks here.
    if cfg.config.poll_interval.is_zero() {
        return Err(BuildgateError::ConfigError(
            "[config].poll_interval must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_app_names(cfg: &RawConfigFile) -> Result<()> {
    let re = Regex::new(APP_NAME_PATTERN).map_err(anyhow::Error::from)?;
    for name in cfg.app.keys() {
        if !re.is_match(name) {
            return Err(BuildgateError::ConfigError(format!(
                "invalid app name '{}': expected letters, digits, '_', '-' or '.'",
                name
            )));
        }
    }
    Ok(())
}

fn validate_executables(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.executable.trim().is_empty() {
        return Err(BuildgateError::ConfigError(
            "[config].executable must not be empty".to_string(),
        ));
    }
    for (name, app) in cfg.app.iter() {
        if matches!(app.executable.as_deref(), Some(exe) if exe.trim().is_empty()) {
            return Err(BuildgateError::ConfigError(format!(
                "app '{}' has an empty `executable`",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn rejects_config_without_apps() {
        let err = parse("[config]\ntimeout = \"1s\"\n").unwrap_err();
        assert!(matches!(err, BuildgateError::ConfigError(msg) if msg.contains("at least one")));
    }

    #[test]
    fn rejects_path_like_app_names() {
        let err = parse("[app.\"../evil\"]\n").unwrap_err();
        assert!(matches!(err, BuildgateError::ConfigError(msg) if msg.contains("../evil")));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = parse("[config]\npoll_interval = \"0ms\"\n[app.blog]\n").unwrap_err();
        assert!(matches!(err, BuildgateError::ConfigError(msg) if msg.contains("poll_interval")));
    }

    #[test]
    fn rejects_malformed_durations_at_parse_time() {
        let err = parse("[app.blog]\ntimeout = \"soon\"\n").unwrap_err();
        assert!(matches!(err, BuildgateError::TomlError(_)));
    }

    #[test]
    fn accepts_minimal_config() {
        let cfg = parse("[app.blog]\n").unwrap();
        assert_eq!(cfg.app.len(), 1);
        assert_eq!(cfg.config.poll_interval, std::time::Duration::from_millis(100));
    }
}
