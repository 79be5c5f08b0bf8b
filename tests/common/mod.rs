#![allow(dead_code)]

pub use shelltask_test_utils::{init_tracing, recording_handle, with_timeout, ManualContext};

use shelltask::exec::ProcessRunner;

/// Runner for `/bin/sh -c <script>`.
pub fn sh(script: &str) -> ProcessRunner {
    let mut runner = ProcessRunner::new("/bin/sh");
    runner
        .set_arguments(Some(vec!["-c".to_string(), script.to_string()]))
        .unwrap();
    runner
}

/// Concatenate recorded chunks.
pub fn concat(chunks: &[Vec<u8>]) -> Vec<u8> {
    chunks.iter().flatten().copied().collect()
}
