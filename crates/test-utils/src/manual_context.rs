use std::sync::{Arc, Mutex};

use shelltask::exec::{CallbackContext, ContextJob};
use tracing::debug;

/// Callback context that queues dispatched jobs until the test runs them.
///
/// Lets a test observe the runner between "run settled" and "callback
/// delivered".
#[derive(Clone, Default)]
pub struct ManualContext {
    jobs: Arc<Mutex<Vec<ContextJob>>>,
}

impl ManualContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    /// Run every queued job in dispatch order; returns how many ran.
    pub fn run_pending(&self) -> usize {
        let jobs: Vec<ContextJob> = std::mem::take(&mut *self.jobs.lock().unwrap());
        let count = jobs.len();
        debug!(count, "running queued completion jobs");
        for job in jobs {
            job();
        }
        count
    }
}

impl CallbackContext for ManualContext {
    fn dispatch(&self, job: ContextJob) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(job);
        debug!(pending = jobs.len(), "queued completion job");
    }
}
