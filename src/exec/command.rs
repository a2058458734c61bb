// src/exec/command.rs

//! Build tool command line construction.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::types::{BuildMode, Environment};

/// Environment variable telling the tool where the lock file lives.
pub const LOCK_FILE_ENV: &str = "BUILDGATE_LOCK_FILE";
/// Environment variable telling the tool where to write failures.
pub const ERROR_FILE_ENV: &str = "BUILDGATE_ERROR_FILE";
/// Environment the host runs in, mirrored for the tool.
pub const ENVIRONMENT_ENV: &str = "BUILDGATE_ENV";

/// Fully resolved invocation of the build tool:
///
/// `<executable> build [--watch] --environment <env> --output-path <dir>`
///
/// run from the app root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub executable: PathBuf,
    pub cwd: PathBuf,
    pub environment: Environment,
    pub output_path: PathBuf,
    pub lockfile: PathBuf,
    pub error_file: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl BuildCommand {
    pub fn args(&self, mode: BuildMode) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["build".into()];
        if mode == BuildMode::Watch {
            args.push("--watch".into());
        }
        args.push("--environment".into());
        args.push(self.environment.as_str().into());
        args.push("--output-path".into());
        args.push(self.output_path.clone().into_os_string());
        args
    }

    /// A `tokio` command with stdout and stderr piped for the output pump.
    ///
    /// The child is killed if its handle is dropped without being stopped.
    pub fn to_command(&self, mode: BuildMode) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(self.args(mode))
            .current_dir(&self.cwd)
            .envs(&self.env)
            .env(ENVIRONMENT_ENV, self.environment.as_str())
            .env(LOCK_FILE_ENV, &self.lockfile)
            .env(ERROR_FILE_ENV, &self.error_file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Rendered for log lines.
    pub fn display(&self, mode: BuildMode) -> String {
        let mut parts = vec![self.executable.display().to_string()];
        parts.extend(
            self.args(mode)
                .iter()
                .map(|a| a.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}
