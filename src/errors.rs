// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildgateError {
    /// The build tool executable is missing or not executable.
    ///
    /// Raised before any subprocess is spawned and before the lock file is
    /// touched, so a missing toolchain never leaves a stale lock behind.
    #[error("Dependency error: {0}")]
    Dependency(String),

    /// The build tool reported a failure.
    ///
    /// The message is the diagnostic text verbatim (usually the contents of
    /// the error file) so every caller surfaces the same actionable output.
    #[error("{0}")]
    Build(String),

    #[error("No build error file at {0:?}")]
    ErrorFileNotFound(PathBuf),

    #[error("Unknown app: {0}")]
    UnknownApp(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildgateError {
    /// True for failures reported by the build tool itself.
    pub fn is_build_failure(&self) -> bool {
        matches!(self, BuildgateError::Build(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildgateError>;
