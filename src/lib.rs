// src/lib.rs

pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod lock;
pub mod logging;
pub mod monitor;
pub mod registry;
pub mod types;
pub mod wait;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::load_and_validate;
use crate::registry::AppRegistry;
use crate::wait::WaitOutcome;

pub use crate::app::App;
pub use crate::errors::BuildgateError;
pub use crate::monitor::BuildMonitor;
pub use crate::types::{BuildMode, BuildOutcome, Environment};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus the `--environment` override)
/// - the app registry
/// - the selected command
/// - Ctrl-C handling for `serve`
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    if let Some(environment) = args.environment {
        cfg.config.environment = environment;
    }

    let registry = AppRegistry::from_config(&cfg);
    info!(
        environment = %registry.environment(),
        apps = ?registry.names().collect::<Vec<_>>(),
        "buildgate configured"
    );

    match args.command {
        Command::Compile { app } => compile(&registry, app.as_deref()).await,
        Command::Serve { app } => serve(&registry, app.as_deref()).await,
        Command::Wait { app, timeout } => wait(&registry, app.as_deref(), timeout).await,
        Command::Status => {
            print_status(&registry);
            Ok(())
        }
    }
}

async fn compile(registry: &AppRegistry, only: Option<&str>) -> Result<()> {
    for app in registry.select(only)? {
        app.compile().await?;
        println!("{}: compiled into {}", app.name(), app.dist_path().display());
    }
    Ok(())
}

async fn serve(registry: &AppRegistry, only: Option<&str>) -> Result<()> {
    let apps = registry.select(only)?;

    let started = async {
        for app in &apps {
            app.start().await?;
        }
        for app in &apps {
            report_wait(app.name(), app.wait().await?);
        }
        Ok::<(), BuildgateError>(())
    };

    // Builds started so far still have to be stopped if startup fails.
    if let Err(e) = started.await {
        if let Err(stop_err) = registry.stop_all().await {
            warn!(error = %stop_err, "cleanup after failed startup also failed");
        }
        return Err(e.into());
    }

    if !registry.environment().watches() {
        return Ok(());
    }

    info!("watching for changes; press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C; stopping now");
    }

    info!("shutting down build tools");
    registry.stop_all().await?;
    Ok(())
}

async fn wait(
    registry: &AppRegistry,
    only: Option<&str>,
    timeout: Option<std::time::Duration>,
) -> Result<()> {
    // A timeout is reported but not fatal; only build failures fail the command.
    for app in registry.select(only)? {
        let monitor = app.monitor();
        let outcome = monitor
            .wait_for(timeout.unwrap_or_else(|| monitor.timeout()))
            .await?;
        report_wait(app.name(), outcome);
    }
    Ok(())
}

fn report_wait(name: &str, outcome: WaitOutcome) {
    match outcome {
        WaitOutcome::Ready { waited } => {
            println!("{name}: ready ({} ms)", waited.as_millis());
        }
        WaitOutcome::TimedOut { waited } => {
            println!("{name}: still building after {} ms", waited.as_millis());
        }
    }
}

fn print_status(registry: &AppRegistry) {
    for status in registry.status() {
        let running = if status.running { " (tool running)" } else { "" };
        println!("{}: {}{}", status.name, status.outcome, running);
    }
}
