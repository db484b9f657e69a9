//! Drives a single provider call to completion.

use super::{ChunkSink, ModelProvider, StreamingProvider};
use crate::types::{ProviderOutput, ProviderRequest, StreamChunk};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(crate) const DEFAULT_STREAM_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy)]
pub(crate) struct DispatchOptions {
    /// Deadline for the provider call; elapsing cancels the request token.
    pub timeout: Option<Duration>,
    /// Capacity of the chunk channel between a streaming provider and the collector.
    pub buffer: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

/// Call `provider` with `req` and produce the raw output.
///
/// When a timeout is set the provider receives a child of the caller's token
/// (or a fresh token), so the timer never cancels the caller's own token.
/// Interruption ends a stream with [`Error::Cancelled`]; a unary call only
/// sees its token fire and its own result is returned.
pub(crate) async fn dispatch(
    provider: &ModelProvider,
    mut req: ProviderRequest,
    opts: DispatchOptions,
) -> Result<ProviderOutput> {
    let token = match (req.cancellation.as_ref(), opts.timeout) {
        (Some(t), Some(_)) => Some(t.child_token()),
        (Some(t), None) => Some(t.clone()),
        (None, Some(_)) => Some(CancellationToken::new()),
        (None, None) => None,
    };
    req.cancellation = token.clone();

    let interrupted = interruption(token, opts.timeout);

    match provider {
        ModelProvider::Streaming(p) => collect_stream(p, req, interrupted, opts.buffer).await,
        ModelProvider::Unary(p) => {
            // Best-effort: the token is signalled, the call still runs to completion.
            let call = p.request(req);
            tokio::pin!(call, interrupted);
            tokio::select! {
                biased;
                res = &mut call => return res.map(ProviderOutput::Response),
                reason = &mut interrupted => {
                    tracing::debug!(provider = p.id(), %reason, "unary call signalled, awaiting completion");
                }
            }
            call.await.map(ProviderOutput::Response)
        }
    }
}

/// Resolves with a reason once the token fires or the deadline passes.
async fn interruption(token: Option<CancellationToken>, timeout: Option<Duration>) -> String {
    let cancelled = async {
        match &token {
            Some(t) => t.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };
    let deadline = async {
        match timeout {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancelled => "cancelled by caller".to_string(),
        _ = deadline => {
            if let Some(t) = &token {
                t.cancel();
            }
            format!("timeout after {}ms", timeout.map(|d| d.as_millis()).unwrap_or_default())
        }
    }
}

/// Accumulate chunk data in arrival order until a terminal chunk.
///
/// The first error chunk fails the whole request and discards what was
/// accumulated. Interruption calls `cancel` on providers that support it and
/// stops consuming immediately.
async fn collect_stream(
    provider: &Arc<dyn StreamingProvider>,
    req: ProviderRequest,
    interrupted: impl Future<Output = String>,
    buffer: usize,
) -> Result<ProviderOutput> {
    let (tx, mut rx) = mpsc::channel(buffer.max(1));
    let producer = provider.stream(req, ChunkSink::new(tx));
    tokio::pin!(producer);
    tokio::pin!(interrupted);

    let mut accumulated = Vec::new();
    let mut producer_done = false;
    let mut channel_open = true;

    loop {
        tokio::select! {
            biased;
            reason = &mut interrupted => {
                tracing::debug!(provider = provider.id(), %reason, "stream interrupted");
                if provider.supports_cancel() {
                    provider.cancel(&reason);
                }
                return Err(Error::Cancelled { reason });
            }
            chunk = rx.recv(), if channel_open => match chunk {
                Some(chunk) => {
                    if let Some(outcome) = absorb(provider.id(), chunk, &mut accumulated) {
                        return outcome;
                    }
                }
                None if producer_done => {
                    tracing::warn!(
                        provider = provider.id(),
                        chunks = accumulated.len(),
                        "stream ended without a terminal chunk"
                    );
                    return Ok(ProviderOutput::Chunks(accumulated));
                }
                // Every sink is gone; only the producer's own result is left to wait for.
                None => channel_open = false,
            },
            res = &mut producer, if !producer_done => {
                producer_done = true;
                // Chunks sent in the producer's final poll are still buffered.
                while let Ok(chunk) = rx.try_recv() {
                    if let Some(outcome) = absorb(provider.id(), chunk, &mut accumulated) {
                        return outcome;
                    }
                }
                res?;
                if !channel_open {
                    return Ok(ProviderOutput::Chunks(accumulated));
                }
            }
        }
    }
}

/// Fold one chunk into `accumulated`; `Some` once the chunk is terminal.
fn absorb(
    provider_id: &str,
    chunk: StreamChunk,
    accumulated: &mut Vec<serde_json::Value>,
) -> Option<Result<ProviderOutput>> {
    if let Some(error) = chunk.error {
        return Some(Err(Error::ProviderStream {
            provider_id: provider_id.to_string(),
            error,
        }));
    }
    if let Some(data) = chunk.data {
        accumulated.push(data);
    }
    if chunk.done {
        return Some(Ok(ProviderOutput::Chunks(std::mem::take(accumulated))));
    }
    None
}
