// src/exec/pump.rs

//! Chunked reader for one output channel of a child process.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tracing::{debug, trace, warn};

use crate::output::{OutputOption, TextSink};
use crate::types::Channel;

/// Largest chunk handed to the sinks in one go.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Chunks read ahead of a busy sink before the reader waits.
const DELIVERY_BACKLOG: usize = 16;

/// Drains one channel until EOF, delivering every chunk to the configured
/// options in order.
///
/// Reads happen on the async runtime. Delivery runs on a blocking-pool
/// thread owned by this pump, so a slow or blocking sink never holds up a
/// runtime worker or the other channel. Chunks reach the sinks in the order
/// the child produced them, and the zero-length read that marks EOF is
/// delivered too.
pub struct StreamPump<R> {
    channel: Channel,
    reader: R,
    options: Arc<[OutputOption]>,
    sink: Arc<dyn TextSink>,
}

impl<R> StreamPump<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(
        channel: Channel,
        reader: R,
        options: Arc<[OutputOption]>,
        sink: Arc<dyn TextSink>,
    ) -> Self {
        Self {
            channel,
            reader,
            options,
            sink,
        }
    }

    /// Read until EOF and return the number of bytes delivered.
    ///
    /// Returns only after the sinks have seen the last chunk. On a read error
    /// the sinks still receive the zero-length terminator before the error
    /// is returned.
    pub async fn run(mut self) -> io::Result<u64> {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(DELIVERY_BACKLOG);
        let delivery = spawn_delivery(self.channel, rx, self.options, self.sink);

        let outcome = read_loop(self.channel, &mut self.reader, &tx).await;
        drop(tx);

        let delivered = finish_delivery(self.channel, delivery).await;
        match (outcome, delivered) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(total), Ok(())) => Ok(total),
        }
    }
}

async fn read_loop<R>(
    channel: Channel,
    reader: &mut R,
    tx: &mpsc::Sender<Vec<u8>>,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Vec::new()).await;
                return Err(e);
            }
        };

        trace!(%channel, bytes = n, "chunk read");
        if tx.send(buf[..n].to_vec()).await.is_err() {
            // Delivery stopped early; its join result carries the reason.
            return Ok(total);
        }

        if n == 0 {
            debug!(%channel, total, "reached EOF");
            return Ok(total);
        }
        total += n as u64;
    }
}

fn spawn_delivery(
    channel: Channel,
    mut rx: mpsc::Receiver<Vec<u8>>,
    options: Arc<[OutputOption]>,
    sink: Arc<dyn TextSink>,
) -> JoinHandle<()> {
    task::spawn_blocking(move || {
        let mut received_data = false;
        while let Some(chunk) = rx.blocking_recv() {
            let initial_chunk = !received_data;
            for option in options.iter() {
                option.process(&chunk, initial_chunk, sink.as_ref());
            }
            if chunk.is_empty() {
                break;
            }
            received_data = true;
        }
        trace!(%channel, "delivery finished");
    })
}

async fn finish_delivery(channel: Channel, delivery: JoinHandle<()>) -> io::Result<()> {
    delivery.await.map_err(|e| {
        warn!(%channel, error = %e, "output delivery stopped");
        io::Error::other(format!("delivering {channel} output: {e}"))
    })
}
