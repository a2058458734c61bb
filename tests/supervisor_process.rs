// tests/supervisor_process.rs
//
// Drives real `/bin/sh` scripts standing in for the build tool.
#![cfg(unix)]

mod common;
use crate::common::builders::{AppConfigBuilder, ConfigFileBuilder};
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use buildgate::config::ConfigFile;
use buildgate::errors::BuildgateError;
use buildgate::fs::RealFileSystem;
use buildgate::types::Environment;
use buildgate::App;
use buildgate_test_utils::scripts::{self, write_tool_script};
use buildgate_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

fn config(base: &Path, environment: Environment, grace: Option<Duration>) -> ConfigFile {
    let mut builder = ConfigFileBuilder::new()
        .environment(environment)
        .poll_interval(Duration::from_millis(20))
        .timeout(Duration::from_secs(3))
        .base_dir(base)
        .with_app("blog", AppConfigBuilder::new().executable("bin/tool").build());
    if let Some(grace) = grace {
        builder = builder.stop_grace_period(grace);
    }
    builder.build()
}

fn app(cfg: &ConfigFile) -> App {
    App::from_config("blog", &cfg.app["blog"], cfg, Arc::new(RealFileSystem))
}

#[tokio::test]
async fn one_shot_build_gets_expected_arguments_and_tees_output() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Test, None);
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::SUCCEED);
    let app = app(&cfg);

    with_timeout(app.compile()).await?;

    let args = std::fs::read_to_string(dir.path().join("blog/args.txt"))?;
    assert_eq!(
        args.trim_end(),
        format!("build --environment test --output-path {}", app.dist_path().display())
    );
    assert!(!app.paths().lockfile().exists());
    assert!(app.dist_path().is_dir());

    let log = std::fs::read_to_string(dir.path().join("log/buildgate-blog.test.log"))?;
    assert!(log.contains("building"), "log was: {log}");
    assert!(log.contains("warning: something minor"), "log was: {log}");
    Ok(())
}

#[tokio::test]
async fn non_utf8_output_does_not_break_a_successful_build() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Test, None);
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::NON_UTF8_OUTPUT);
    let app = app(&cfg);

    with_timeout(app.compile()).await?;

    assert!(!app.paths().lockfile().exists());
    let log = std::fs::read_to_string(dir.path().join("log/buildgate-blog.test.log"))?;
    assert!(log.contains("compiling caf\u{FFFD}.js"), "log was: {log}");
    assert!(log.contains("processed module 1999"));
    Ok(())
}

#[tokio::test]
async fn error_file_written_by_tool_becomes_build_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Production, None);
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::SYNTAX_ERROR);
    let app = app(&cfg);

    match with_timeout(app.compile()).await {
        Err(BuildgateError::Build(msg)) => assert_eq!(msg, "SyntaxError: unexpected token\n"),
        other => panic!("expected build failure, got {other:?}"),
    }
    assert!(app.paths().lockfile().exists());
    Ok(())
}

#[tokio::test]
async fn crash_without_error_file_reports_exit_status_and_output() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Test, None);
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::CRASH);
    let app = app(&cfg);

    match with_timeout(app.compile()).await {
        Err(BuildgateError::Build(msg)) => {
            assert!(msg.contains("exit status 3"), "message was: {msg}");
            assert!(msg.contains("Segmentation fault"), "message was: {msg}");
        }
        other => panic!("expected build failure, got {other:?}"),
    }
    assert!(!app.paths().build_error_file().exists());
    Ok(())
}

#[tokio::test]
async fn watch_mode_is_interrupted_on_stop() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Development, Some(Duration::from_secs(2)));
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::WATCH);
    let app = app(&cfg);

    let outcome = with_timeout(app.build()).await?;
    assert!(outcome.is_ready());
    assert!(app.monitor().is_running());

    let args = std::fs::read_to_string(dir.path().join("blog/args.txt"))?;
    assert!(args.starts_with("build --watch --environment development"), "args were: {args}");

    with_timeout(app.stop()).await?;
    assert!(!app.monitor().is_running());
    assert!(dir.path().join("blog/interrupted.txt").exists());

    // Second stop has nothing to do.
    app.stop().await?;
    Ok(())
}

#[tokio::test]
async fn tool_ignoring_interrupt_is_killed_after_grace_period() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Development, Some(Duration::from_millis(200)));
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::STUBBORN_WATCH);
    let app = app(&cfg);

    assert!(with_timeout(app.build()).await?.is_ready());

    let started = std::time::Instant::now();
    with_timeout(app.stop()).await?;
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(!app.monitor().is_running());
    Ok(())
}

#[tokio::test]
async fn restarting_watch_replaces_the_previous_process() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Development, Some(Duration::from_secs(2)));
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::WATCH);
    let app = app(&cfg);

    assert!(with_timeout(app.build()).await?.is_ready());
    assert!(with_timeout(app.build()).await?.is_ready());

    // The first watcher was interrupted before the second was spawned.
    assert!(dir.path().join("blog/interrupted.txt").exists());
    assert!(app.monitor().is_running());

    with_timeout(app.stop()).await?;
    Ok(())
}

#[tokio::test]
async fn restart_stops_the_old_watcher_before_resetting_the_lock() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Development, Some(Duration::from_secs(2)));
    write_tool_script(dir.path().join("blog/bin/tool"), scripts::RESTARTABLE_WATCH);
    let app = app(&cfg);

    assert!(with_timeout(app.build()).await?.is_ready());

    // The old watcher drops the lock on SIGINT; that must happen before the
    // fresh lock for the second build exists.
    with_timeout(app.start()).await?;
    assert!(app.paths().lockfile().exists());

    let outcome = app.monitor().wait_for(Duration::from_millis(200)).await?;
    assert!(!outcome.is_ready(), "restarted build looked ready: {outcome:?}");

    with_timeout(app.stop()).await?;
    Ok(())
}

#[tokio::test]
async fn missing_executable_is_a_dependency_error_without_lock() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = config(dir.path(), Environment::Test, None);
    let app = app(&cfg);

    match app.compile().await {
        Err(BuildgateError::Dependency(msg)) => assert!(msg.contains("blog"), "message was: {msg}"),
        other => panic!("expected dependency error, got {other:?}"),
    }
    assert!(!app.paths().lockfile().exists());
    Ok(())
}
