use super::{ChannelKind, MessageChannel, MessageEnvelope, MessageHandler};
use crate::types::Subscription;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Handlers {
    by_type: HashMap<String, Vec<(u64, MessageHandler)>>,
    last: HashMap<String, MessageEnvelope>,
}

struct Inner {
    handlers: Mutex<Handlers>,
    next_id: AtomicU64,
    closed: AtomicBool,
    sticky: bool,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Handlers> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process channel that awaits each matching handler in registration order.
///
/// In sticky mode the latest envelope of every type is kept, and a handler
/// registered later receives it immediately.
#[derive(Clone)]
pub struct LocalChannel {
    inner: Arc<Inner>,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn sticky() -> Self {
        Self::build(true)
    }

    fn build(sticky: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                handlers: Mutex::new(Handlers::default()),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                sticky,
            }),
        }
    }

    pub fn is_sticky(&self) -> bool {
        self.inner.sticky
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn handler_count(&self, message_type: &str) -> usize {
        self.inner
            .lock()
            .by_type
            .get(message_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Latest envelope of `message_type`; always `None` unless sticky.
    pub fn last(&self, message_type: &str) -> Option<MessageEnvelope> {
        self.inner.lock().last.get(message_type).cloned()
    }
}

impl Default for LocalChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageChannel for LocalChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Ipc
    }

    async fn send(&self, msg: MessageEnvelope) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }
        // Snapshot so handlers may subscribe or unsubscribe while running.
        let targets: Vec<MessageHandler> = {
            let mut handlers = self.inner.lock();
            if self.inner.sticky {
                handlers.last.insert(msg.message_type.clone(), msg.clone());
            }
            handlers
                .by_type
                .get(&msg.message_type)
                .map(|hs| hs.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        tracing::trace!(message_type = %msg.message_type, handlers = targets.len(), "dispatching envelope");
        for handler in targets {
            handler(msg.clone()).await;
        }
        Ok(())
    }

    async fn on(&self, message_type: &str, handler: MessageHandler) -> Subscription {
        if self.is_closed() {
            return Subscription::noop();
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let replay = {
            let mut handlers = self.inner.lock();
            handlers
                .by_type
                .entry(message_type.to_string())
                .or_default()
                .push((id, handler.clone()));
            handlers.last.get(message_type).cloned()
        };
        if let Some(msg) = replay {
            handler(msg).await;
        }

        let weak = Arc::downgrade(&self.inner);
        let message_type = message_type.to_string();
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut handlers = inner.lock();
                if let Some(hs) = handlers.by_type.get_mut(&message_type) {
                    hs.retain(|(hid, _)| *hid != id);
                    if hs.is_empty() {
                        handlers.by_type.remove(&message_type);
                    }
                }
            }
        })
    }

    fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            let mut handlers = self.inner.lock();
            handlers.by_type.clear();
            handlers.last.clear();
            tracing::debug!("local channel closed");
        }
    }
}
