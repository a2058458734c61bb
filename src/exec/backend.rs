// src/exec/backend.rs

//! Pluggable build backend abstraction.
//!
//! The build monitor talks to a `BuildBackend` instead of spawning processes
//! itself. Production code uses [`ProcessSupervisor`](super::ProcessSupervisor);
//! tests can provide a backend that plays the part of the build tool by
//! writing the lock/error files directly.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

/// Boxed future returned by backend operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Result of a one-shot build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Last lines of merged stdout/stderr.
    pub output_tail: Vec<String>,
}

impl RunReport {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            output_tail: Vec::new(),
        }
    }

    pub fn failed(exit_code: i32) -> Self {
        Self {
            exit_code: Some(exit_code),
            success: false,
            output_tail: Vec::new(),
        }
    }
}

/// How a build tool instance is started and stopped.
pub trait BuildBackend: Send + Sync {
    /// Fail with `BuildgateError::Dependency` if the tool cannot be run.
    ///
    /// Called before the lock file is reset.
    fn validate(&self) -> Result<()>;

    /// Run a one-shot build to completion.
    fn run_once(&self) -> BackendFuture<'_, RunReport>;

    /// Start a watch-mode build and return once it has been spawned.
    fn spawn_watch(&self) -> BackendFuture<'_, ()>;

    /// Stop a tracked watch-mode process. No-op if none is tracked.
    fn stop(&self) -> BackendFuture<'_, ()>;

    /// Whether a watch-mode process is currently tracked.
    fn is_running(&self) -> bool;
}
