// src/monitor/state.rs

//! Pure build monitor state machine.
//!
//! No IO, no Tokio: the [`BuildMonitor`](super::BuildMonitor) drives these
//! transitions around its filesystem and process calls.

use std::fmt;

/// Lifecycle of one app's build as seen by this host process.
///
/// ```text
/// Idle → Preparing → Building → Ready
///            ↑                ↘ Failed
///            └──── Ready / Failed (new build request)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No build has been requested by this process.
    Idle,
    /// Lock/error files reset; the tool has not been started yet.
    Preparing,
    /// The tool has been started and has not reported a terminal state.
    Building,
    Ready,
    Failed,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonitorState::Idle => "idle",
            MonitorState::Preparing => "preparing",
            MonitorState::Building => "building",
            MonitorState::Ready => "ready",
            MonitorState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// State plus the in-memory failure detail that has no error file behind it
/// (e.g. the tool exited non-zero without writing one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorCore {
    state: MonitorState,
    failure: Option<String>,
}

impl Default for MonitorCore {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorCore {
    pub fn new() -> Self {
        Self {
            state: MonitorState::Idle,
            failure: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Failure recorded by this process that the error file does not carry.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Any state → `Preparing`. Clears recorded failures.
    pub fn prepare(&mut self) {
        self.state = MonitorState::Preparing;
        self.failure = None;
    }

    /// `Preparing → Building`. Returns `false` (and changes nothing) from
    /// any other state; callers must prepare first.
    pub fn start_build(&mut self) -> bool {
        if self.state != MonitorState::Preparing {
            return false;
        }
        self.state = MonitorState::Building;
        true
    }

    /// `Building → Ready`. Other states are left alone: a wait that
    /// succeeds on an `Idle` monitor says nothing about a build of ours.
    pub fn complete(&mut self) {
        if self.state == MonitorState::Building {
            self.state = MonitorState::Ready;
        }
    }

    /// → `Failed`, optionally recording a detail not backed by an error file.
    pub fn fail(&mut self, detail: Option<String>) {
        self.state = MonitorState::Failed;
        if detail.is_some() {
            self.failure = detail;
        }
    }
}
