// src/wait/mod.rs

//! Readiness gate.
//!
//! [`ReadinessWaiter`] polls an app's lock protocol until the build
//! succeeds, fails, or a timeout expires. [`LockDirWatcher`] optionally
//! wakes it early on filesystem changes (via `notify`).

pub mod waiter;
pub mod watcher;

pub use waiter::{ReadinessWaiter, WaitOutcome};
pub use watcher::LockDirWatcher;
