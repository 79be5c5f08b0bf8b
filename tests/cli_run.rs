// tests/cli_run.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tempfile::NamedTempFile;

use shelltask::cli::{CliArgs, Mode};
use shelltask::exec::RunResult;
use shelltask::{exit_code_for, report_line, run, run_with_output};

#[test]
fn parses_program_and_trailing_arguments() {
    let args = CliArgs::try_parse_from([
        "shelltask", "--mode", "print", "--prefix", "[sh]", "--env", "A=1", "--", "/bin/sh",
        "-c", "echo hi",
    ])
    .unwrap();

    assert_eq!(args.mode, Mode::Print);
    assert_eq!(args.prefix.as_deref(), Some("[sh]"));
    assert_eq!(args.env, vec![("A".to_string(), "1".to_string())]);
    assert_eq!(args.program.as_deref(), Some("/bin/sh"));
    assert_eq!(args.args, vec!["-c", "echo hi"]);
}

#[test]
fn rejects_malformed_env_pairs() {
    assert!(CliArgs::try_parse_from(["shelltask", "--env", "NOVALUE", "true"]).is_err());
    assert!(CliArgs::try_parse_from(["shelltask", "--env", "=x", "true"]).is_err());
}

/// Writer the tests can read back after `run_with_output` took ownership.
#[derive(Clone, Default)]
struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn report_lines_per_outcome() {
    assert_eq!(
        report_line(&RunResult::Success, Mode::Handle, 42),
        "task completed successfully. the output was 42 bytes"
    );
    assert_eq!(
        report_line(&RunResult::Success, Mode::Print, 42),
        "task completed successfully."
    );
    assert_eq!(
        report_line(&RunResult::Failure(2), Mode::Handle, 0),
        "task terminated with code: 2"
    );
    assert_eq!(
        report_line(&RunResult::Error("no such file".into()), Mode::Basic, 0),
        "task could not be run: no such file"
    );
}

#[test]
fn exit_code_mapping() {
    assert_eq!(exit_code_for(&RunResult::Success), 0);
    assert_eq!(exit_code_for(&RunResult::Failure(9)), 9);
    assert_eq!(exit_code_for(&RunResult::Error("nope".into())), 1);
}

#[tokio::test]
async fn run_reports_the_child_exit_code() {
    init_tracing();

    let args = CliArgs::try_parse_from(["shelltask", "--", "/bin/sh", "-c", "exit 5"]).unwrap();
    assert_eq!(with_timeout(run(args)).await.unwrap(), 5);
}

#[tokio::test]
async fn run_applies_env_overrides_in_handle_mode() {
    init_tracing();

    let args = CliArgs::try_parse_from([
        "shelltask",
        "--mode",
        "handle",
        "--env",
        "EXPECTED=yes",
        "--",
        "/bin/sh",
        "-c",
        "test \"$EXPECTED\" = yes",
    ])
    .unwrap();
    assert_eq!(with_timeout(run(args)).await.unwrap(), 0);
}

#[tokio::test]
async fn handle_mode_reports_the_size_of_all_stdout() {
    init_tracing();

    // 20000 bytes on stdout spans several read chunks; stderr is not counted.
    let args = CliArgs::try_parse_from([
        "shelltask",
        "--mode",
        "handle",
        "--",
        "/bin/sh",
        "-c",
        "printf '%020000d' 0; echo ignored >&2",
    ])
    .unwrap();

    let out = SharedOutput::default();
    assert_eq!(with_timeout(run_with_output(args, out.clone())).await.unwrap(), 0);
    assert_eq!(
        out.text(),
        "task completed successfully. the output was 20000 bytes\n"
    );
}

#[tokio::test]
async fn basic_mode_reports_the_exit_code() {
    init_tracing();

    let args = CliArgs::try_parse_from(["shelltask", "--", "/bin/sh", "-c", "exit 4"]).unwrap();

    let out = SharedOutput::default();
    assert_eq!(with_timeout(run_with_output(args, out.clone())).await.unwrap(), 4);
    assert_eq!(out.text(), "task terminated with code: 4\n");
}

#[tokio::test]
async fn run_uses_the_task_file() {
    init_tracing();

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[process]
launch_path = "/bin/sh"
arguments = ["-c", "exit 3"]
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let args = CliArgs::try_parse_from(["shelltask", "--config", path]).unwrap();
    assert_eq!(with_timeout(run(args)).await.unwrap(), 3);
}

#[tokio::test]
async fn run_without_a_program_fails() {
    let args = CliArgs::try_parse_from(["shelltask"]).unwrap();
    assert!(run(args).await.is_err());
}
