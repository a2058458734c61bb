// src/monitor/mod.rs

//! Build monitor: one per app.
//!
//! The pure state machine lives in [`state`]; the IO-facing façade that
//! combines the lock protocol, build backend and readiness waiter is
//! [`build_monitor::BuildMonitor`].

pub mod build_monitor;
pub mod state;

pub use build_monitor::BuildMonitor;
pub use state::{MonitorCore, MonitorState};
