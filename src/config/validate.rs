// src/config/validate.rs

use crate::config::model::{OutputSection, ProcessConfig, RawTaskFile, TaskFile};
use crate::errors::{Result, ShellTaskError};
use crate::types::Channel;

impl TryFrom<RawTaskFile> for TaskFile {
    type Error = ShellTaskError;

    fn try_from(raw: RawTaskFile) -> std::result::Result<Self, Self::Error> {
        validate_process(&raw.process)?;
        validate_output(&raw.output)?;
        Ok(TaskFile::new_unchecked(raw.process, raw.output))
    }
}

/// Check the invariants every launch relies on.
///
/// - the launch path is non-empty
/// - environment keys are non-empty and contain neither `=` nor NUL
pub fn validate_process(cfg: &ProcessConfig) -> Result<()> {
    if cfg.launch_path.as_os_str().is_empty() {
        return Err(ShellTaskError::ConfigError(
            "launch_path must not be empty".to_string(),
        ));
    }

    for key in cfg.environment.iter().flat_map(|env| env.keys()) {
        if key.is_empty() {
            return Err(ShellTaskError::ConfigError(
                "environment variable names must not be empty".to_string(),
            ));
        }
        if key.contains('=') || key.contains('\0') {
            return Err(ShellTaskError::ConfigError(format!(
                "invalid environment variable name '{}'",
                key.escape_debug()
            )));
        }
    }

    Ok(())
}

fn validate_output(output: &OutputSection) -> Result<()> {
    for channel in [Channel::Stdout, Channel::Stderr] {
        if output.prefix_for(channel).is_some() && !output.print.contains(&channel) {
            return Err(ShellTaskError::ConfigError(format!(
                "[output].{channel}_prefix is set but {channel} is not listed in [output].print"
            )));
        }
    }
    Ok(())
}
