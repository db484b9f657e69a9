use crate::types::StreamChunk;
use crate::{Error, ErrorContext, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where a streaming provider sends its chunks.
///
/// Bounded: `send` waits while the consumer is behind. After a terminal chunk
/// (done or error) every further send is rejected, and once the consumer has
/// stopped (request finished, failed or was cancelled) sends fail too.
#[derive(Clone)]
pub struct ChunkSink {
    tx: mpsc::Sender<StreamChunk>,
    terminated: Arc<AtomicBool>,
}

impl ChunkSink {
    pub(crate) fn new(tx: mpsc::Sender<StreamChunk>) -> Self {
        Self {
            tx,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn send(&self, chunk: StreamChunk) -> Result<()> {
        let terminal = chunk.is_terminal();
        let already = if terminal {
            self.terminated.swap(true, Ordering::AcqRel)
        } else {
            self.terminated.load(Ordering::Acquire)
        };
        if already {
            return Err(Error::runtime_with_context(
                "chunk emitted after terminal chunk",
                ErrorContext::new().with_source("chunk_sink"),
            ));
        }
        self.tx
            .send(chunk)
            .await
            .map_err(|_| Error::cancelled("stream consumer stopped"))
    }

    pub async fn data(&self, data: impl Into<serde_json::Value>) -> Result<()> {
        self.send(StreamChunk::data(data)).await
    }

    pub async fn done(&self) -> Result<()> {
        self.send(StreamChunk::done()).await
    }

    pub async fn error(&self, error: impl Into<serde_json::Value>) -> Result<()> {
        self.send(StreamChunk::error(error)).await
    }

    /// True once a terminal chunk was sent or the consumer went away.
    pub fn is_closed(&self) -> bool {
        self.terminated.load(Ordering::Acquire) || self.tx.is_closed()
    }
}
