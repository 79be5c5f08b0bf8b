// src/exec/barrier.rs

//! Completion barrier merging the three end-of-run signals.
//!
//! A run is complete once stdout reached EOF, stderr reached EOF and the
//! process exit code is known. The signals arrive from three independent
//! Tokio tasks in any order; the barrier evaluates and fires under a single
//! lock, so exactly one caller observes the transition and the
//! [`Completion`] record is handed over through a one-shot channel.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::types::Channel;

/// One of the prerequisite signals of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Eof(Channel),
    Exit(i32),
}

/// Settled state of a finished run.
///
/// `fault` holds the first failure reported alongside a signal (stream read
/// error, wait error); `None` means the exit code can be trusted as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub exit_code: i32,
    pub fault: Option<String>,
}

#[derive(Debug, Default)]
struct BarrierState {
    stdout_eof: bool,
    stderr_eof: bool,
    exit_code: Option<i32>,
    fault: Option<String>,
    done_tx: Option<oneshot::Sender<Completion>>,
}

#[derive(Debug)]
pub struct CompletionBarrier {
    state: Mutex<BarrierState>,
}

impl CompletionBarrier {
    /// Create a barrier and the receiver its completion is delivered on.
    pub fn new() -> (Self, oneshot::Receiver<Completion>) {
        let (done_tx, done_rx) = oneshot::channel();
        let barrier = Self {
            state: Mutex::new(BarrierState {
                done_tx: Some(done_tx),
                ..BarrierState::default()
            }),
        };
        (barrier, done_rx)
    }

    /// Record `signal`. Returns `true` for the one call that completed the
    /// barrier.
    ///
    /// Repeated signals are no-ops; a second `Exit` keeps the first code.
    pub fn signal(&self, signal: Signal) -> bool {
        self.apply(signal, None)
    }

    /// Record `signal` together with a failure reason.
    ///
    /// The run still completes normally once every signal is in, but the
    /// resulting [`Completion`] carries the first reason reported.
    pub fn fail(&self, signal: Signal, reason: impl Into<String>) -> bool {
        self.apply(signal, Some(reason.into()))
    }

    pub fn is_complete(&self) -> bool {
        self.lock().done_tx.is_none()
    }

    fn apply(&self, signal: Signal, fault: Option<String>) -> bool {
        let mut state = self.lock();

        if state.done_tx.is_none() {
            trace!(?signal, "signal after completion ignored");
            return false;
        }

        if let Some(reason) = fault {
            state.fault.get_or_insert(reason);
        }

        match signal {
            Signal::Eof(Channel::Stdout) => state.stdout_eof = true,
            Signal::Eof(Channel::Stderr) => state.stderr_eof = true,
            Signal::Exit(code) => {
                state.exit_code.get_or_insert(code);
            }
        }

        let Some(exit_code) = state.exit_code else {
            return false;
        };
        if !(state.stdout_eof && state.stderr_eof) {
            return false;
        }

        let completion = Completion {
            exit_code,
            fault: state.fault.clone(),
        };
        if let Some(done_tx) = state.done_tx.take() {
            if done_tx.send(completion).is_err() {
                debug!("completion receiver dropped before the run settled");
            }
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
