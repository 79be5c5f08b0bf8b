// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `shelltask`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shelltask",
    version,
    about = "Run a program, stream its output and report how it exited.",
    long_about = None
)]
pub struct CliArgs {
    /// Task file (TOML) describing the process to run.
    ///
    /// Mutually exclusive with PROGRAM.
    #[arg(long, value_name = "PATH", conflicts_with = "program")]
    pub config: Option<PathBuf>,

    /// What to do with the child's output.
    #[arg(long, value_enum, default_value_t = Mode::Basic)]
    pub mode: Mode,

    /// Prefix for every printed line (only used with `--mode print`).
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Working directory for the child process.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Extra environment variable for the child, on top of the inherited
    /// environment. May be repeated.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHELLTASK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Program to launch.
    #[arg(value_name = "PROGRAM")]
    pub program: Option<String>,

    /// Arguments passed to PROGRAM.
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

/// Output handling modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Only report the result; output options come from the task file, if any.
    Basic,
    /// Print stdout and stderr, optionally prefixing every line.
    Print,
    /// Collect stdout in memory and report its size on completion.
    Handle,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid KEY=VALUE pair: '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
