// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::Environment;

/// Command-line arguments for `buildgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildgate",
    version,
    about = "Supervise front-end build tools and gate on their readiness.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Buildgate.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Override `[config].environment`.
    #[arg(long, value_name = "ENV", value_parser = parse_environment, global = true)]
    pub environment: Option<Environment>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run one-shot builds and exit non-zero if any fails.
    Compile {
        /// Only build this app.
        #[arg(long, value_name = "NAME")]
        app: Option<String>,
    },

    /// Start builds for the environment, wait until they are ready, and keep
    /// watch-mode tools running until Ctrl-C.
    Serve {
        #[arg(long, value_name = "NAME")]
        app: Option<String>,
    },

    /// Wait for builds started elsewhere (e.g. by another worker) to finish.
    Wait {
        #[arg(long, value_name = "NAME")]
        app: Option<String>,

        /// Override the configured timeout (e.g. "30s").
        #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
        timeout: Option<std::time::Duration>,
    },

    /// Print each app's build outcome.
    Status,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_environment(s: &str) -> Result<Environment, String> {
    s.parse()
}

fn parse_duration(s: &str) -> Result<std::time::Duration, String> {
    crate::config::duration::parse_duration(s)
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wait_with_timeout() {
        let args = CliArgs::try_parse_from([
            "buildgate",
            "--environment",
            "test",
            "wait",
            "--app",
            "blog",
            "--timeout",
            "30s",
        ])
        .unwrap();

        assert_eq!(args.environment, Some(Environment::Test));
        match args.command {
            Command::Wait { app, timeout } => {
                assert_eq!(app.as_deref(), Some("blog"));
                assert_eq!(timeout, Some(std::time::Duration::from_secs(30)));
            }
            other => panic!("expected wait, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_environment() {
        assert!(CliArgs::try_parse_from(["buildgate", "--environment", "staging", "status"]).is_err());
    }
}
