// src/output/mod.rs

//! Output sinks attached to a child's stdout / stderr.
//!
//! Every chunk read from a channel is passed to each configured
//! [`OutputOption`] in list order:
//! - [`OutputOption::Print`] decodes the chunk as UTF-8 and writes it to the
//!   runner's [`TextSink`], tagging every line with an optional prefix.
//! - [`OutputOption::Handle`] forwards the raw bytes to a caller-supplied
//!   handler, including the zero-length chunk that marks end-of-stream.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{trace, warn};

pub mod mock;

pub use mock::MemorySink;

/// Raw chunk handler used by [`OutputOption::Handle`].
pub type ChunkHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// How one chunk of a channel's output is consumed.
#[derive(Clone)]
pub enum OutputOption {
    Print { prefix: Option<String> },
    Handle(ChunkHandler),
}

impl OutputOption {
    pub fn print(prefix: Option<String>) -> Self {
        OutputOption::Print { prefix }
    }

    pub fn handle<F>(handler: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        OutputOption::Handle(Arc::new(handler))
    }

    /// Feed one chunk to this option.
    ///
    /// `initial_chunk` is true until the channel has delivered its first
    /// non-empty chunk. An empty `chunk` means end-of-stream.
    pub fn process(&self, chunk: &[u8], initial_chunk: bool, sink: &dyn TextSink) {
        match self {
            OutputOption::Print { prefix } => {
                if let Some(text) = render_print_chunk(chunk, prefix.as_deref(), initial_chunk) {
                    sink.write_text(&text);
                }
            }
            OutputOption::Handle(handler) => handler(chunk),
        }
    }
}

impl fmt::Debug for OutputOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputOption::Print { prefix } => {
                f.debug_struct("Print").field("prefix", prefix).finish()
            }
            OutputOption::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

/// Render a chunk for [`OutputOption::Print`].
///
/// Returns `None` when the chunk is not valid UTF-8; such chunks are dropped.
///
/// - EOF (empty chunk) renders as a single `"\n"`, with or without prefix.
/// - Without a prefix the text is returned verbatim.
/// - With a prefix, the first non-empty chunk of a channel starts with
///   `"<prefix> "` and every `"\n"` becomes `"\n<prefix> "`.
pub fn render_print_chunk(chunk: &[u8], prefix: Option<&str>, initial_chunk: bool) -> Option<String> {
    let text = match std::str::from_utf8(chunk) {
        Ok(text) => text,
        Err(e) => {
            trace!(bytes = chunk.len(), error = %e, "dropping chunk that is not valid UTF-8");
            return None;
        }
    };

    if text.is_empty() {
        return Some("\n".to_string());
    }

    let Some(prefix) = prefix else {
        return Some(text.to_string());
    };

    let tag = format!("{prefix} ");
    let mut output = String::with_capacity(text.len() + tag.len());
    if initial_chunk {
        output.push_str(&tag);
    }
    output.push_str(text);

    Some(output.replace('\n', &format!("\n{tag}")))
}

/// Destination for text produced by [`OutputOption::Print`].
pub trait TextSink: Send + Sync {
    fn write_text(&self, text: &str);
}

/// Writes printed output to the host's stdout, flushing after every chunk so
/// partial lines show up as they arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl TextSink for StdoutSink {
    fn write_text(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write printed output to stdout");
        }
    }
}
