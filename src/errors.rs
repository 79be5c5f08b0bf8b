// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellTaskError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A run is active on this runner; launching again or changing its
    /// configuration is not allowed until the completion callback returns.
    #[error("the process runner has already launched")]
    AlreadyRunning,

    #[error("no Tokio runtime available to drive the process")]
    NoRuntime,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShellTaskError>;
