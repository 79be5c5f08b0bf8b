// src/config/mod.rs

//! Configuration for shelltask runs.
//!
//! Responsibilities:
//! - Define the process configuration and the TOML task file model (`model.rs`).
//! - Load a task file from disk (`loader.rs`).
//! - Validate basic invariants like a non-empty launch path (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{OutputSection, ProcessConfig, RawTaskFile, TaskFile};
pub use validate::validate_process;
