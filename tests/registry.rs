// tests/registry.rs

mod common;
use crate::common::builders::{AppConfigBuilder, ConfigFileBuilder};
use crate::common::fake_tool::{fake_app, FakeBehaviour, FakeBuildTool};
use crate::common::{init_tracing, mock_fs};

use std::error::Error;

use buildgate::config::ConfigFile;
use buildgate::errors::BuildgateError;
use buildgate::fs::mock::MockFileSystem;
use buildgate::fs::FileSystem;
use buildgate::monitor::MonitorState;
use buildgate::registry::AppRegistry;
use buildgate::types::{BuildOutcome, Environment};

type TestResult = Result<(), Box<dyn Error>>;

fn two_app_config(environment: Environment) -> ConfigFile {
    ConfigFileBuilder::new()
        .environment(environment)
        .base_dir("/srv")
        .with_app("admin", AppConfigBuilder::new().build())
        .with_app("blog", AppConfigBuilder::new().build())
        .build()
}

fn registry(
    environment: Environment,
    behaviour: FakeBehaviour,
) -> (MockFileSystem, FakeBuildTool, FakeBuildTool, AppRegistry) {
    let cfg = two_app_config(environment);
    let (fs, shared) = mock_fs();
    let (admin_tool, admin) = fake_app("admin", &cfg, shared.clone(), behaviour.clone());
    let (blog_tool, blog) = fake_app("blog", &cfg, shared, behaviour);
    let registry = AppRegistry::from_apps(environment, vec![admin, blog]);
    (fs, admin_tool, blog_tool, registry)
}

#[tokio::test(start_paused = true)]
async fn ensure_ready_launches_builds_once_for_concurrent_callers() -> TestResult {
    init_tracing();
    let (_fs, admin, blog, registry) = registry(Environment::Development, FakeBehaviour::Succeed);

    let (a, b, c) = tokio::join!(
        registry.ensure_ready(),
        registry.ensure_ready(),
        registry.ensure_ready()
    );
    a?;
    b?;
    c?;
    registry.ensure_ready().await?;

    assert_eq!(admin.calls(), vec!["validate", "spawn_watch"]);
    assert_eq!(blog.calls(), vec!["validate", "spawn_watch"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn non_development_environments_compile_once() -> TestResult {
    init_tracing();
    let (fs, admin, blog, registry) = registry(Environment::Test, FakeBehaviour::Succeed);

    registry.ensure_ready().await?;

    assert_eq!(admin.calls(), vec!["validate", "run_once"]);
    assert_eq!(blog.calls(), vec!["validate", "run_once"]);
    assert!(!fs.exists("/srv/blog/tmp/build.lock".as_ref()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_build_fails_the_gate() -> TestResult {
    init_tracing();
    let (_fs, _admin, _blog, registry) = registry(
        Environment::Development,
        FakeBehaviour::Fail {
            message: "Build Error".to_string(),
            exit_code: 1,
        },
    );

    match registry.ensure_ready().await {
        Err(BuildgateError::Build(msg)) => assert_eq!(msg, "Build Error"),
        other => panic!("expected build failure, got {other:?}"),
    }
    assert!(registry.check_all().is_err());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unknown_app_is_reported_by_name() -> TestResult {
    init_tracing();
    let (_fs, _admin, _blog, registry) = registry(Environment::Test, FakeBehaviour::Succeed);

    match registry.get("shop") {
        Err(BuildgateError::UnknownApp(name)) => assert_eq!(name, "shop"),
        other => panic!("expected unknown app, got {other:?}"),
    }
    assert!(registry.select(Some("shop")).is_err());
    assert_eq!(registry.select(Some("blog"))?.len(), 1);
    assert_eq!(registry.select(None)?.len(), 2);
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["admin", "blog"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn status_reflects_each_app() -> TestResult {
    init_tracing();
    let (_fs, _admin, blog_tool, registry) = registry(Environment::Development, FakeBehaviour::Succeed);
    blog_tool.set_behaviour(FakeBehaviour::Hang);

    registry.get("admin")?.build().await?;
    registry.get("blog")?.start().await?;

    let status = registry.status();
    assert_eq!(status.len(), 2);

    assert_eq!(status[0].name, "admin");
    assert_eq!(status[0].outcome, BuildOutcome::Success);
    assert_eq!(status[0].state, MonitorState::Ready);
    assert!(status[0].running);

    assert_eq!(status[1].name, "blog");
    assert_eq!(status[1].outcome, BuildOutcome::Pending);
    assert_eq!(status[1].state, MonitorState::Building);

    registry.stop_all().await?;
    assert!(registry.status().iter().all(|s| !s.running));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn compile_all_and_build_all_cover_every_app() -> TestResult {
    init_tracing();
    let (_fs, admin, blog, registry) = registry(Environment::Production, FakeBehaviour::Succeed);

    registry.compile_all().await?;
    let outcomes = registry.build_all().await?;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|(_, outcome)| outcome.is_ready()));
    assert_eq!(outcomes[0].0, "admin");
    // `build_all` reuses the memoized compile.
    assert_eq!(admin.calls(), vec!["validate", "run_once"]);
    assert_eq!(blog.calls(), vec!["validate", "run_once"]);
    registry.check_all()?;
    Ok(())
}
