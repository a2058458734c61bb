// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the build tool, using
//! `tokio::process::Command`, and for stopping it again.
//!
//! - [`command`] builds the tool's command line.
//! - [`output`] drains, tees and tails the tool's merged output.
//! - [`supervisor`] owns the subprocess handle and the stop protocol.
//! - [`backend`] provides the `BuildBackend` trait the build monitor talks
//!   to, so tests can swap in a fake tool.

pub mod backend;
pub mod command;
pub mod output;
pub mod supervisor;

pub use backend::{BackendFuture, BuildBackend, RunReport};
pub use command::BuildCommand;
pub use supervisor::ProcessSupervisor;
