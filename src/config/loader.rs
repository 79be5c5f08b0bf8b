// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawTaskFile, TaskFile};
use crate::errors::Result;

/// Load a task file from a given path and return the raw `RawTaskFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to also
/// check the semantic invariants.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawTaskFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawTaskFile = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a task file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<TaskFile> {
    let raw = load_from_path(&path)?;
    TaskFile::try_from(raw)
}
