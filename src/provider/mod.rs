//! 模型提供方抽象：统一流式与一次性调用的后端。
//!
//! # Model Providers
//!
//! A provider serves exactly one [`Capability`] and implements one of two
//! call contracts:
//!
//! - [`StreamingProvider`]: pushes [`StreamChunk`]s into a [`ChunkSink`] and
//!   may support cooperative `cancel`.
//! - [`UnaryProvider`]: resolves a single [`ProviderResponse`].
//!
//! [`ModelProvider`] is the tagged union of the two. The variant is fixed
//! when the provider is constructed, so dispatch never checks for methods at runtime.
//!
//! Actual backends (HTTP chat APIs, TTS engines, on-device STT/VAD) live
//! outside this crate and plug in through these traits.

mod dispatch;
mod sink;

pub(crate) use dispatch::{dispatch, DispatchOptions};
pub use sink::ChunkSink;

use crate::types::{Capability, ProviderRequest, ProviderResponse};
use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

#[cfg(doc)]
use crate::types::StreamChunk;

/// Backend that emits its result incrementally.
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> Capability;

    /// Emit chunks into `sink`. Returning without a terminal chunk ends the
    /// stream successfully with whatever was emitted.
    async fn stream(&self, req: ProviderRequest, sink: ChunkSink) -> Result<()>;

    /// Ask an in-flight stream to stop. Called when the request is cancelled.
    fn cancel(&self, _reason: &str) {}

    fn supports_cancel(&self) -> bool {
        false
    }
}

/// Backend that answers with a single response.
#[async_trait]
pub trait UnaryProvider: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> Capability;
    async fn request(&self, req: ProviderRequest) -> Result<ProviderResponse>;
}

/// A registered provider, tagged by call contract.
#[derive(Clone)]
pub enum ModelProvider {
    Streaming(Arc<dyn StreamingProvider>),
    Unary(Arc<dyn UnaryProvider>),
}

impl ModelProvider {
    pub fn streaming<P: StreamingProvider + 'static>(provider: P) -> Self {
        ModelProvider::Streaming(Arc::new(provider))
    }

    pub fn unary<P: UnaryProvider + 'static>(provider: P) -> Self {
        ModelProvider::Unary(Arc::new(provider))
    }

    pub fn id(&self) -> &str {
        match self {
            ModelProvider::Streaming(p) => p.id(),
            ModelProvider::Unary(p) => p.id(),
        }
    }

    pub fn kind(&self) -> Capability {
        match self {
            ModelProvider::Streaming(p) => p.kind(),
            ModelProvider::Unary(p) => p.kind(),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, ModelProvider::Streaming(_))
    }

    pub fn supports_cancel(&self) -> bool {
        match self {
            ModelProvider::Streaming(p) => p.supports_cancel(),
            ModelProvider::Unary(_) => false,
        }
    }
}

impl fmt::Debug for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = if self.is_streaming() { "Streaming" } else { "Unary" };
        f.debug_struct(variant)
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}
