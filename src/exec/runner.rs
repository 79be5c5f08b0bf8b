// src/exec/runner.rs

//! Single-run process runner.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{validate_process, ProcessConfig, TaskFile};
use crate::errors::{Result, ShellTaskError};
use crate::output::{OutputOption, StdoutSink, TextSink};
use crate::types::Channel;

use super::barrier::{CompletionBarrier, Signal};
use super::context::{CallbackContext, MainContext};
use super::pump::StreamPump;
use super::{RunPhase, RunResult};

/// Runs one child process at a time and reports its outcome through a
/// completion callback.
///
/// Configuration (arguments, environment, working directory, output options)
/// can only be changed while the runner is idle; setters return
/// [`ShellTaskError::AlreadyRunning`] otherwise.
///
/// `launch` needs a Tokio runtime: the process, both pumps and the exit
/// observer run as Tokio tasks, and the callback is delivered on the
/// runner's [`CallbackContext`] (a [`MainContext`] unless one was supplied).
pub struct ProcessRunner {
    config: ProcessConfig,
    stdout_options: Vec<OutputOption>,
    stderr_options: Vec<OutputOption>,
    text_sink: Arc<dyn TextSink>,
    context: OnceLock<Arc<dyn CallbackContext>>,
    phase: Arc<watch::Sender<RunPhase>>,
    runs: AtomicU64,
}

impl fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("config", &self.config)
            .field("stdout_options", &self.stdout_options)
            .field("stderr_options", &self.stderr_options)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl ProcessRunner {
    pub fn new(launch_path: impl Into<PathBuf>) -> Self {
        Self::from_config(ProcessConfig::new(launch_path))
    }

    pub fn from_config(config: ProcessConfig) -> Self {
        let (phase, _) = watch::channel(RunPhase::Idle);
        Self {
            config,
            stdout_options: Vec::new(),
            stderr_options: Vec::new(),
            text_sink: Arc::new(StdoutSink),
            context: OnceLock::new(),
            phase: Arc::new(phase),
            runs: AtomicU64::new(0),
        }
    }

    /// Build a runner from a validated task file, including its output
    /// options.
    pub fn from_task_file(task: &TaskFile) -> Self {
        let mut runner = Self::from_config(task.process().clone());
        runner.stdout_options = task.options_for(Channel::Stdout);
        runner.stderr_options = task.options_for(Channel::Stderr);
        runner
    }

    /// Replace the sink `Print` options write to (stdout by default).
    pub fn with_text_sink(mut self, sink: impl TextSink + 'static) -> Self {
        self.text_sink = Arc::new(sink);
        self
    }

    /// Deliver completion callbacks on `context` instead of a [`MainContext`].
    pub fn with_context(mut self, context: Arc<dyn CallbackContext>) -> Self {
        self.context = OnceLock::from(context);
        self
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn options(&self, channel: Channel) -> &[OutputOption] {
        match channel {
            Channel::Stdout => &self.stdout_options,
            Channel::Stderr => &self.stderr_options,
        }
    }

    pub fn set_arguments(&mut self, arguments: Option<Vec<String>>) -> Result<()> {
        self.ensure_idle()?;
        self.config.arguments = arguments;
        Ok(())
    }

    pub fn set_environment(&mut self, environment: Option<BTreeMap<String, String>>) -> Result<()> {
        self.ensure_idle()?;
        self.config.environment = environment;
        Ok(())
    }

    pub fn set_current_dir(&mut self, current_dir: Option<PathBuf>) -> Result<()> {
        self.ensure_idle()?;
        self.config.current_dir = current_dir;
        Ok(())
    }

    pub fn set_options(&mut self, channel: Channel, options: Vec<OutputOption>) -> Result<()> {
        self.ensure_idle()?;
        match channel {
            Channel::Stdout => self.stdout_options = options,
            Channel::Stderr => self.stderr_options = options,
        }
        Ok(())
    }

    pub fn set_stdout_options(&mut self, options: Vec<OutputOption>) -> Result<()> {
        self.set_options(Channel::Stdout, options)
    }

    pub fn set_stderr_options(&mut self, options: Vec<OutputOption>) -> Result<()> {
        self.set_options(Channel::Stderr, options)
    }

    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    /// True from `launch` until the completion callback has returned.
    pub fn is_running(&self) -> bool {
        self.phase() == RunPhase::Running
    }

    /// Watch the runner's phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    /// Wait until no run is active.
    pub async fn wait_idle(&self) {
        let mut phase = self.phase.subscribe();
        // The sender lives in `self`, so this only ends once Idle is observed.
        let _ = phase.wait_for(|p| *p == RunPhase::Idle).await;
    }

    /// Launch the configured process asynchronously.
    ///
    /// Returns immediately. `on_complete` is called exactly once on the
    /// runner's callback context after the process exited and both output
    /// channels reached EOF; the runner is idle again once it returns.
    ///
    /// # Panics
    ///
    /// Launching while a run is active is a programming error and panics, as
    /// does launching with an invalid configuration or outside a Tokio
    /// runtime. Use [`ProcessRunner::try_launch`] to get these as errors.
    pub fn launch<F>(&self, on_complete: F)
    where
        F: FnOnce(RunResult) + Send + 'static,
    {
        if let Err(err) = self.try_launch(on_complete) {
            panic!(
                "cannot launch '{}': {err}",
                self.config.launch_path.display()
            );
        }
    }

    /// Like [`ProcessRunner::launch`], but reports misuse as an error
    /// instead of panicking.
    pub fn try_launch<F>(&self, on_complete: F) -> Result<()>
    where
        F: FnOnce(RunResult) + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| ShellTaskError::NoRuntime)?;
        validate_process(&self.config)?;

        let claimed = self.phase.send_if_modified(|phase| match *phase {
            RunPhase::Idle => {
                *phase = RunPhase::Running;
                true
            }
            RunPhase::Running => false,
        });
        if !claimed {
            return Err(ShellTaskError::AlreadyRunning);
        }

        let context = Arc::clone(self.context.get_or_init(|| {
            let context: Arc<dyn CallbackContext> = MainContext::spawn_on(&handle);
            context
        }));

        let run_id = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        info!(run_id, command = %self.config.display_command(), "launching process");

        let job = RunJob {
            run_id,
            config: self.config.clone(),
            stdout_options: self.stdout_options.clone().into(),
            stderr_options: self.stderr_options.clone().into(),
            sink: Arc::clone(&self.text_sink),
        };
        let reset = PhaseReset {
            phase: Arc::clone(&self.phase),
            run_id,
        };

        handle.spawn(async move {
            let result = job.execute().await;
            debug!(run_id, ?result, "run settled; dispatching completion callback");

            context.dispatch(Box::new(move || {
                // Dropped after the callback returns, even if it unwinds.
                let _reset = reset;
                on_complete(result);
            }));
        });

        Ok(())
    }

    /// Launch and wait for the result and for the runner to become idle.
    pub async fn run(&self) -> Result<RunResult> {
        let (tx, rx) = oneshot::channel();
        self.try_launch(move |result| {
            let _ = tx.send(result);
        })?;

        let result = rx.await.map_err(|_| {
            ShellTaskError::Other(anyhow::anyhow!(
                "completion callback dropped without a result"
            ))
        })?;
        self.wait_idle().await;
        Ok(result)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_running() {
            return Err(ShellTaskError::AlreadyRunning);
        }
        Ok(())
    }
}

/// Returns the runner to Idle when dropped.
struct PhaseReset {
    phase: Arc<watch::Sender<RunPhase>>,
    run_id: u64,
}

impl Drop for PhaseReset {
    fn drop(&mut self) {
        self.phase.send_replace(RunPhase::Idle);
        debug!(run_id = self.run_id, "run state reset; runner idle");
    }
}

/// Everything one run needs, snapshotted at launch.
struct RunJob {
    run_id: u64,
    config: ProcessConfig,
    stdout_options: Arc<[OutputOption]>,
    stderr_options: Arc<[OutputOption]>,
    sink: Arc<dyn TextSink>,
}

impl RunJob {
    async fn execute(self) -> RunResult {
        let run_id = self.run_id;

        let mut child = match build_command(&self.config).spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(run_id, error = %e, "failed to spawn process");
                return RunResult::Error(format!(
                    "spawning '{}': {e}",
                    self.config.launch_path.display()
                ));
            }
        };
        debug!(run_id, pid = child.id(), "process spawned");

        let (barrier, done_rx) = CompletionBarrier::new();
        let barrier = Arc::new(barrier);

        let handles = [
            spawn_pump(
                run_id,
                Channel::Stdout,
                child.stdout.take(),
                self.stdout_options,
                Arc::clone(&self.sink),
                Arc::clone(&barrier),
            ),
            spawn_pump(
                run_id,
                Channel::Stderr,
                child.stderr.take(),
                self.stderr_options,
                Arc::clone(&self.sink),
                Arc::clone(&barrier),
            ),
            tokio::spawn(observe_exit(run_id, child, Arc::clone(&barrier))),
        ];
        // Only the observers hold the barrier now; if they all stop without
        // completing it, `done_rx` resolves with an error instead of hanging.
        drop(barrier);

        let completion = done_rx.await;

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(run_id, error = %e, "run observer task failed");
            }
        }

        match completion {
            Ok(completion) => RunResult::from(completion),
            Err(_) => RunResult::Error(
                "run observers stopped before the process settled".to_string(),
            ),
        }
    }
}

fn build_command(config: &ProcessConfig) -> Command {
    let mut cmd = Command::new(&config.launch_path);

    if let Some(arguments) = &config.arguments {
        cmd.args(arguments);
    }
    if let Some(environment) = &config.environment {
        cmd.env_clear().envs(environment);
    }
    if let Some(dir) = &config.current_dir {
        cmd.current_dir(dir);
    }

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd
}

fn spawn_pump<R>(
    run_id: u64,
    channel: Channel,
    reader: Option<R>,
    options: Arc<[OutputOption]>,
    sink: Arc<dyn TextSink>,
    barrier: Arc<CompletionBarrier>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(reader) = reader else {
            warn!(run_id, %channel, "no pipe available; treating channel as closed");
            barrier.signal(Signal::Eof(channel));
            return;
        };

        match StreamPump::new(channel, reader, options, sink).run().await {
            Ok(bytes) => {
                debug!(run_id, %channel, bytes, "stream pump finished");
                barrier.signal(Signal::Eof(channel));
            }
            Err(e) => {
                error!(run_id, %channel, error = %e, "reading process output failed");
                barrier.fail(Signal::Eof(channel), format!("reading {channel}: {e}"));
            }
        }
    })
}

async fn observe_exit(run_id: u64, mut child: Child, barrier: Arc<CompletionBarrier>) {
    match child.wait().await {
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            info!(
                run_id,
                exit_code = code,
                success = status.success(),
                "process exited"
            );
            barrier.signal(Signal::Exit(code));
        }
        Err(e) => {
            error!(run_id, error = %e, "waiting for process failed");
            barrier.fail(Signal::Exit(-1), format!("waiting for process: {e}"));
        }
    }
}
