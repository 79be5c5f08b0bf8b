// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::output::OutputOption;
use crate::types::Channel;

/// What to launch and how.
///
/// - `arguments`: passed to the program in order; `None` means no arguments.
/// - `environment`: when present it *replaces* the host environment; when
///   absent the child inherits the host environment.
/// - `current_dir`: when absent the child inherits the host's current
///   directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessConfig {
    pub launch_path: PathBuf,

    #[serde(default)]
    pub arguments: Option<Vec<String>>,

    #[serde(default)]
    pub environment: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub current_dir: Option<PathBuf>,
}

impl ProcessConfig {
    pub fn new(launch_path: impl Into<PathBuf>) -> Self {
        Self {
            launch_path: launch_path.into(),
            arguments: None,
            environment: None,
            current_dir: None,
        }
    }

    /// Program and arguments joined by spaces, for log lines.
    pub fn display_command(&self) -> String {
        let mut line = self.launch_path.display().to_string();
        for arg in self.arguments.iter().flatten() {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Task file as read from TOML, before validation.
///
/// ```toml
/// [process]
/// launch_path = "/bin/sh"
/// arguments = ["-c", "echo hello"]
/// current_dir = "/tmp"
///
/// [process.environment]
/// PATH = "/usr/bin:/bin"
///
/// [output]
/// print = ["stdout", "stderr"]
/// stdout_prefix = "[out]"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskFile {
    pub process: ProcessConfig,

    #[serde(default)]
    pub output: OutputSection,
}

/// `[output]` section: which channels are printed and with which prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputSection {
    /// Channels whose output is printed to the runner's text sink.
    #[serde(default)]
    pub print: Vec<Channel>,

    #[serde(default)]
    pub stdout_prefix: Option<String>,

    #[serde(default)]
    pub stderr_prefix: Option<String>,
}

impl OutputSection {
    pub fn prefix_for(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Stdout => self.stdout_prefix.as_deref(),
            Channel::Stderr => self.stderr_prefix.as_deref(),
        }
    }
}

/// Validated task file. Obtain one through `TaskFile::try_from` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct TaskFile {
    process: ProcessConfig,
    output: OutputSection,
}

impl TaskFile {
    pub(crate) fn new_unchecked(process: ProcessConfig, output: OutputSection) -> Self {
        Self { process, output }
    }

    pub fn process(&self) -> &ProcessConfig {
        &self.process
    }

    pub fn output(&self) -> &OutputSection {
        &self.output
    }

    /// Output options the task file asks for on `channel`.
    pub fn options_for(&self, channel: Channel) -> Vec<OutputOption> {
        if self.output.print.contains(&channel) {
            vec![OutputOption::print(
                self.output.prefix_for(channel).map(str::to_string),
            )]
        } else {
            Vec::new()
        }
    }
}
