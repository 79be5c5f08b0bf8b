// src/exec/context.rs

//! Execution context that completion callbacks are delivered on.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Unit of work handed to a [`CallbackContext`].
pub type ContextJob = Box<dyn FnOnce() + Send + 'static>;

/// Where a runner delivers its terminal callback.
///
/// Tests can provide their own implementation, for example one that queues
/// jobs and runs them on demand.
pub trait CallbackContext: Send + Sync {
    fn dispatch(&self, job: ContextJob);
}

/// Default front-end context: a single Tokio task that runs dispatched jobs
/// one after another, in dispatch order.
#[derive(Debug, Clone)]
pub struct MainContext {
    tx: mpsc::UnboundedSender<ContextJob>,
}

impl MainContext {
    /// Spawn the context loop on the given runtime.
    pub fn spawn_on(handle: &Handle) -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<ContextJob>();

        handle.spawn(async move {
            debug!("callback context started");
            while let Some(job) = rx.recv().await {
                job();
            }
            debug!("callback context finished (all senders dropped)");
        });

        Arc::new(Self { tx })
    }
}

impl CallbackContext for MainContext {
    fn dispatch(&self, job: ContextJob) {
        // The loop is gone once a job panicked or the runtime it was spawned
        // on shut down. A runner reused from another runtime hits the latter.
        // The callback must still run.
        if let Err(mpsc::error::SendError(job)) = self.tx.send(job) {
            warn!("callback context is gone; running completion inline");
            job();
        }
    }
}
