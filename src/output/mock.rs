// src/output/mock.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::TextSink;

/// In-memory [`TextSink`] that accumulates everything written to it.
///
/// Clones share the same buffer, so a test can hand one clone to a runner and
/// read the output back through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    pub fn take(&self) -> String {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextSink for MemorySink {
    fn write_text(&self, text: &str) {
        self.lock().push_str(text);
    }
}
