//! # airi-core
//!
//! 这是一个可插拔的能力运行时核心：将请求路由到聊天、语音合成、语音识别与语音活动检测等后端。
//!
//! Capability runtime core: routes typed requests to pluggable model
//! providers (chat, TTS, STT, VAD) through processor chains contributed by
//! plugins, backed by a strictly validated configuration.
//!
//! ## Overview
//!
//! The core never talks to an engine itself. Providers are injected by the
//! host (directly or through plugins), and every request flows through the
//! same four steps:
//!
//! ```text
//! resolve provider → input processors → dispatch (stream or unary) → output processors
//! ```
//!
//! ## Key Features
//!
//! - **Tagged providers**: [`ModelProvider`] is either streaming or unary, fixed at registration
//! - **Plugins**: [`plugins::Plugin`]s register processors and providers during `init()`
//! - **Strict config**: [`config::ConfigService`] validates against a JSON Schema generated from the types
//! - **Backpressure**: stream chunks travel over a bounded channel
//! - **Cancellation**: cooperative, via `tokio_util::sync::CancellationToken`, plus an optional per-request timeout
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airi_core::provider::{ChunkSink, StreamingProvider};
//! use airi_core::types::{Capability, ProviderRequest};
//! use airi_core::{CoreClientBuilder, ModelProvider};
//! use async_trait::async_trait;
//! use serde_json::json;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl StreamingProvider for Echo {
//!     fn id(&self) -> &str { "echo" }
//!     fn kind(&self) -> Capability { Capability::Chat }
//!     async fn stream(&self, req: ProviderRequest, sink: ChunkSink) -> airi_core::Result<()> {
//!         sink.data(req.params).await?;
//!         sink.done().await
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> airi_core::Result<()> {
//!     let client = CoreClientBuilder::new()
//!         .provider(ModelProvider::streaming(Echo))
//!         .build()?;
//!     client.init().await?;
//!
//!     let out = client
//!         .request("echo", ProviderRequest::new(Capability::Chat, json!("hello")))
//!         .await?;
//!     println!("{:?}", out.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Config schema, validation service and storage backends |
//! | [`plugins`] | Plugin trait, setup context and registry |
//! | [`pipeline`] | Processor trait and ordered processor chains |
//! | [`provider`] | Streaming and unary provider contracts |
//! | [`channel`] | Message channel abstraction and an in-process implementation |
//! | [`client`] | Core client and builder |
//! | [`types`] | Requests, responses, chunks and subscriptions |

pub mod channel;
pub mod client;
pub mod config;
pub mod pipeline;
pub mod plugins;
pub mod provider;
pub mod types;

// Re-export main types for convenience
pub use client::{CoreClient, CoreClientBuilder};
pub use config::{Config, ConfigService};
pub use plugins::{ConflictPolicy, Plugin, PluginContext, PluginRegistry};
pub use provider::ModelProvider;
pub use types::{Capability, ProviderOutput, ProviderRequest, ProviderResponse, StreamChunk};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
