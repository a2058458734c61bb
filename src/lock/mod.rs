// src/lock/mod.rs

//! Filesystem lock/error protocol.
//!
//! Two sentinel files live in an app-scoped tmp directory:
//!
//! - `build.lock`: present while a build is pending or running. Created by
//!   [`LockProtocol::reset`], removed by the build tool when it finishes
//!   successfully. Nothing in this crate ever removes it.
//! - `error.txt`: present when the most recent build failed, holding the
//!   tool's diagnostic text. Cleared by [`LockProtocol::reset`].
//!
//! All state lives on disk, so separate host processes sharing the same tmp
//! directory observe the same [`BuildOutcome`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{BuildgateError, Result};
use crate::fs::FileSystem;
use crate::types::BuildOutcome;

pub const LOCK_FILE_NAME: &str = "build.lock";
pub const ERROR_FILE_NAME: &str = "error.txt";

#[derive(Debug, Clone)]
pub struct LockProtocol {
    fs: Arc<dyn FileSystem>,
    tmp_dir: PathBuf,
    lockfile: PathBuf,
    error_file: PathBuf,
}

impl LockProtocol {
    pub fn new(fs: Arc<dyn FileSystem>, tmp_dir: impl Into<PathBuf>) -> Self {
        let tmp_dir = tmp_dir.into();
        Self {
            lockfile: tmp_dir.join(LOCK_FILE_NAME),
            error_file: tmp_dir.join(ERROR_FILE_NAME),
            tmp_dir,
            fs,
        }
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn lockfile(&self) -> &Path {
        &self.lockfile
    }

    pub fn error_file(&self) -> &Path {
        &self.error_file
    }

    /// Clear any stale error and (re)create an empty lock file.
    ///
    /// Must run before the build process is spawned; otherwise a fast build
    /// can finish before the lock exists and waiters see the previous state.
    pub fn reset(&self) -> Result<()> {
        self.fs.create_dir_all(&self.tmp_dir)?;
        if self.fs.remove_if_exists(&self.error_file)? {
            debug!(path = ?self.error_file, "removed stale build error file");
        }
        self.fs.write(&self.lockfile, b"")?;
        debug!(path = ?self.lockfile, "build lock created");
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.fs.is_file(&self.lockfile)
    }

    pub fn has_error(&self) -> bool {
        self.fs.is_file(&self.error_file)
    }

    /// Diagnostic text of the last failed build.
    ///
    /// Invalid UTF-8 is replaced rather than rejected: whatever the tool
    /// wrote is still a build failure.
    pub fn read_error(&self) -> Result<String> {
        if !self.has_error() {
            return Err(BuildgateError::ErrorFileNotFound(self.error_file.clone()));
        }
        let bytes = self.fs.read(&self.error_file)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn outcome(&self) -> BuildOutcome {
        BuildOutcome::from_markers(self.is_locked(), self.has_error())
    }

    /// `Err(Build)` carrying the error file contents if the last build failed.
    pub fn ensure_no_error(&self) -> Result<()> {
        if self.has_error() {
            return Err(BuildgateError::Build(self.read_error()?));
        }
        Ok(())
    }
}
