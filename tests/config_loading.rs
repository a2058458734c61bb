// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use buildgate::app::PathSet;
use buildgate::config::load_and_validate;
use buildgate::errors::BuildgateError;
use buildgate::types::Environment;

type TestResult = Result<(), Box<dyn Error>>;

const FULL: &str = r#"
[config]
environment = "production"
timeout = "30s"
poll_interval = "250ms"
stop_grace_period = "2s"
executable = "node_modules/.bin/ember"
log_dir = "var/log"

[app.blog]
root = "frontend/blog"
output = "public/blog"
timeout = "1m"
env = { JOBS = "1" }

[app.admin]
executable = "yarn"
"#;

fn write_config(dir: &Path, contents: &str) -> std::io::Result<std::path::PathBuf> {
    let path = dir.join("Buildgate.toml");
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn full_config_is_loaded_and_anchored_at_its_directory() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = load_and_validate(write_config(dir.path(), FULL)?)?;

    assert_eq!(cfg.base_dir, dir.path());
    assert_eq!(cfg.config.environment, Environment::Production);
    assert_eq!(cfg.config.poll_interval, Duration::from_millis(250));
    assert_eq!(cfg.config.stop_grace_period, Some(Duration::from_secs(2)));

    let blog = &cfg.app["blog"];
    assert_eq!(blog.effective_timeout(&cfg.config), Duration::from_secs(60));
    assert_eq!(blog.env.get("JOBS").map(String::as_str), Some("1"));

    let admin = &cfg.app["admin"];
    assert_eq!(admin.effective_timeout(&cfg.config), Duration::from_secs(30));
    assert_eq!(admin.effective_executable(&cfg.config), "yarn");

    let paths = PathSet::from_config("blog", blog, &cfg);
    assert_eq!(paths.root(), dir.path().join("frontend/blog"));
    assert_eq!(paths.dist(), dir.path().join("public/blog"));
    assert_eq!(paths.log(), dir.path().join("var/log/buildgate-blog.production.log"));
    Ok(())
}

#[test]
fn minimal_config_uses_defaults() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = load_and_validate(write_config(dir.path(), "[app.blog]\n")?)?;

    assert_eq!(cfg.config.environment, Environment::Development);
    assert_eq!(cfg.config.timeout, Duration::from_secs(5));
    assert_eq!(cfg.config.stop_grace_period, None);
    assert!(cfg.config.tee_output);

    let paths = PathSet::from_config("blog", &cfg.app["blog"], &cfg);
    assert_eq!(paths.tmp(), dir.path().join("blog/tmp"));
    assert_eq!(paths.dist(), dir.path().join("tmp/buildgate/apps/blog"));
    Ok(())
}

#[test]
fn config_without_apps_is_rejected() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), "[config]\ntimeout = \"5s\"\n")?;

    match load_and_validate(path) {
        Err(BuildgateError::ConfigError(msg)) => assert!(msg.contains("[app."), "message was: {msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn bad_duration_is_a_toml_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), "[config]\ntimeout = \"soon\"\n[app.blog]\n")?;

    assert!(matches!(load_and_validate(path), Err(BuildgateError::TomlError(_))));
    Ok(())
}

#[test]
fn unsafe_app_name_is_rejected() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), "[app.\"../escape\"]\n")?;

    assert!(matches!(load_and_validate(path), Err(BuildgateError::ConfigError(_))));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(BuildgateError::IoError(_))));
}
