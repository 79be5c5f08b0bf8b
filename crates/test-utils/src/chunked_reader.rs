use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// `AsyncRead` that yields a scripted sequence of chunks, one per read, then
/// EOF.
///
/// A scripted `Err` entry makes the corresponding read fail with that error
/// kind.
#[derive(Debug, Default)]
pub struct ChunkedReader {
    script: VecDeque<Result<Vec<u8>, io::ErrorKind>>,
}

impl ChunkedReader {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            script: chunks.into_iter().map(|c| Ok(c.into())).collect(),
        }
    }

    /// Append a read that fails with `kind`.
    pub fn then_fail(mut self, kind: io::ErrorKind) -> Self {
        self.script.push_back(Err(kind));
        self
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.script.pop_front() {
            None => Poll::Ready(Ok(())),
            Some(Err(kind)) => Poll::Ready(Err(io::Error::new(kind, "scripted read failure"))),
            Some(Ok(mut chunk)) => {
                let n = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.script.push_front(Ok(chunk.split_off(n)));
                }
                Poll::Ready(Ok(()))
            }
        }
    }
}
