//! 类型模块：请求、响应与流式分片的核心数据类型。
//!
//! # Types Module
//!
//! Core data types shared by providers, processors and the client.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Capability`] | Closed set of provider kinds (chat, tts, stt, vad) |
//! | [`ProviderRequest`] | Request routed to a provider, with optional cancellation |
//! | [`ProviderResponse`] | Result of a unary provider call |
//! | [`StreamChunk`] | One increment of a streaming provider's output |
//! | [`ProviderOutput`] | Dispatch result handed to output processors |
//! | [`Subscription`] | Handle that detaches a listener when dropped |
//!
//! ## Example
//!
//! ```rust
//! use airi_core::types::{Capability, ProviderRequest};
//! use serde_json::json;
//!
//! let req = ProviderRequest::new(Capability::Chat, json!({"text": "hello"}));
//! assert_eq!(req.kind, Capability::Chat);
//! ```

pub mod capability;
pub mod chunk;
pub mod request;
pub mod subscription;

pub use capability::Capability;
pub use chunk::StreamChunk;
pub use request::{ProviderOutput, ProviderRequest, ProviderResponse};
pub use subscription::Subscription;
