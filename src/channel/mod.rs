//! 消息通道：核心只消费该抽象，不关心具体传输。
//!
//! # Message Channels
//!
//! A [`MessageChannel`] carries typed [`MessageEnvelope`]s between the core
//! and the rest of the application (UI, bridge processes, remote peers). The
//! core never implements a transport itself; hosts inject one through the
//! client builder.
//!
//! [`LocalChannel`] is an in-process implementation, useful for tests and for
//! wiring components that share a process.

mod local;

pub use local::LocalChannel;

use crate::types::Subscription;
use crate::Result;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Transport family behind a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Ipc,
    Ws,
    Webrtc,
    Http,
    Grpc,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Ipc => "ipc",
            ChannelKind::Ws => "ws",
            ChannelKind::Webrtc => "webrtc",
            ChannelKind::Http => "http",
            ChannelKind::Grpc => "grpc",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Internal,
    Ui,
    Bridge,
}

/// A typed message, e.g. `chat/token` or `scene/update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<Destination>,
}

impl MessageEnvelope {
    pub fn new(message_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
            dest: None,
        }
    }

    pub fn with_dest(mut self, dest: Destination) -> Self {
        self.dest = Some(dest);
        self
    }
}

/// Callback invoked for every envelope of the type it was registered for.
pub type MessageHandler = Arc<dyn Fn(MessageEnvelope) -> BoxFuture<'static, ()> + Send + Sync>;

/// Build a [`MessageHandler`] from a synchronous closure.
pub fn handler_fn<F>(f: F) -> MessageHandler
where
    F: Fn(MessageEnvelope) + Send + Sync + 'static,
{
    Arc::new(move |msg| {
        f(msg);
        std::future::ready(()).boxed()
    })
}

/// Build a [`MessageHandler`] from a closure returning a future.
pub fn async_handler<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(MessageEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |msg| f(msg).boxed())
}

/// Transport for envelopes.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn send(&self, msg: MessageEnvelope) -> Result<()>;

    /// Register `handler` for envelopes whose type equals `message_type`.
    ///
    /// Async so implementations can deliver replayed state before returning.
    async fn on(&self, message_type: &str, handler: MessageHandler) -> Subscription;

    fn close(&self);
}
