// src/exec/mod.rs

//! Process execution layer.
//!
//! A [`ProcessRunner`] launches one child process at a time with
//! `tokio::process::Command` and reports a single [`RunResult`] once the
//! process has exited *and* both of its output channels reached EOF.
//!
//! - [`pump`] drains one output channel and feeds the configured sinks.
//! - [`barrier`] merges stdout EOF, stderr EOF and the exit code into one
//!   completion event.
//! - [`context`] provides the front-end context completion callbacks run on.
//! - [`runner`] owns configuration and the Idle/Running state machine, and
//!   wires everything together for each run.

pub mod barrier;
pub mod context;
pub mod pump;
pub mod runner;

pub use barrier::{Completion, CompletionBarrier, Signal};
pub use context::{CallbackContext, ContextJob, MainContext};
pub use pump::StreamPump;
pub use runner::ProcessRunner;

/// Outcome of one run, as passed to the completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// The process exited with code 0.
    Success,
    /// The process exited with a non-zero code, or `-1` when it was
    /// terminated without one (e.g. by a signal).
    Failure(i32),
    /// No trustworthy exit status: the process could not be spawned or
    /// waited on, or one of its output channels failed to read.
    Error(String),
}

impl RunResult {
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            RunResult::Success
        } else {
            RunResult::Failure(code)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunResult::Success => Some(0),
            RunResult::Failure(code) => Some(*code),
            RunResult::Error(_) => None,
        }
    }
}

impl From<Completion> for RunResult {
    fn from(completion: Completion) -> Self {
        match completion.fault {
            Some(reason) => RunResult::Error(reason),
            None => RunResult::from_exit_code(completion.exit_code),
        }
    }
}

/// Lifecycle of a [`ProcessRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    /// From `launch` until the completion callback has returned.
    Running,
}
