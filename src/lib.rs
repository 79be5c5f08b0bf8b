// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod output;
pub mod types;

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::cli::{CliArgs, Mode};
use crate::config::load_and_validate;
use crate::exec::{ProcessRunner, RunResult};
use crate::output::OutputOption;

/// High-level entry point used by `main.rs`.
///
/// Builds a runner from the task file or the command line, applies the
/// selected output mode, launches the process and waits for the completion
/// callback. Returns the exit code `shelltask` itself should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    run_with_output(args, io::stdout()).await
}

/// Same as [`run`], but the outcome line goes to `out` instead of stdout.
pub async fn run_with_output<W>(args: CliArgs, mut out: W) -> Result<i32>
where
    W: Write + Send + 'static,
{
    let mut runner = build_runner(&args)?;

    let collected = Arc::new(Mutex::new(Vec::<u8>::new()));
    match args.mode {
        Mode::Basic => {}
        Mode::Print => {
            let options = vec![OutputOption::print(args.prefix.clone())];
            runner.set_stdout_options(options.clone())?;
            runner.set_stderr_options(options)?;
        }
        Mode::Handle => {
            let buffer = Arc::clone(&collected);
            runner.set_stdout_options(vec![OutputOption::handle(move |chunk| {
                buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(chunk);
            })])?;
        }
    }

    let mode = args.mode;
    let (tx, rx) = oneshot::channel();
    runner.try_launch(move |result| {
        let bytes = collected.lock().unwrap_or_else(PoisonError::into_inner).len();
        if let Err(e) = writeln!(out, "{}", report_line(&result, mode, bytes)) {
            warn!(error = %e, "could not write the run report");
        }
        let _ = tx.send(result);
    })?;

    let result = rx.await.context("waiting for the completion callback")?;
    runner.wait_idle().await;
    debug!(?result, "shelltask run complete");

    Ok(exit_code_for(&result))
}

fn build_runner(args: &CliArgs) -> Result<ProcessRunner> {
    let mut runner = match (&args.config, &args.program) {
        (Some(path), _) => {
            let task = load_and_validate(path)
                .with_context(|| format!("loading task file {}", path.display()))?;
            ProcessRunner::from_task_file(&task)
        }
        (None, Some(program)) => {
            let mut runner = ProcessRunner::new(program);
            if !args.args.is_empty() {
                runner.set_arguments(Some(args.args.clone()))?;
            }
            runner
        }
        (None, None) => bail!("nothing to run: pass PROGRAM or --config <PATH>"),
    };

    if let Some(cwd) = &args.cwd {
        runner.set_current_dir(Some(cwd.clone()))?;
    }

    if !args.env.is_empty() {
        // Start from the task file's environment, or the host's, then override.
        let mut environment: BTreeMap<String, String> = match &runner.config().environment {
            Some(env) => env.clone(),
            None => host_environment(),
        };
        environment.extend(args.env.iter().cloned());
        runner.set_environment(Some(environment))?;
    }

    Ok(runner)
}

/// The host environment, minus entries that are not valid Unicode.
fn host_environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                let key = key.unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
                warn!(%key, "skipping host variable that is not valid Unicode");
                None
            }
        })
        .collect()
}

/// The line the demo driver prints once a run completes. `collected_bytes`
/// is the size of the stdout captured in handle mode.
pub fn report_line(result: &RunResult, mode: Mode, collected_bytes: usize) -> String {
    match result {
        RunResult::Success if mode == Mode::Handle => {
            format!("task completed successfully. the output was {collected_bytes} bytes")
        }
        RunResult::Success => "task completed successfully.".to_string(),
        RunResult::Failure(code) => format!("task terminated with code: {code}"),
        RunResult::Error(reason) => format!("task could not be run: {reason}"),
    }
}

/// Exit code `shelltask` reports for a run.
pub fn exit_code_for(result: &RunResult) -> i32 {
    match result {
        RunResult::Success => 0,
        RunResult::Failure(code) => *code,
        RunResult::Error(_) => 1,
    }
}
