//! Config backend contract and the in-memory backend.

use crate::types::Subscription;
use crate::Result;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback invoked whenever the stored value changes.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Raw storage for the config document.
///
/// Values are opaque here; [`crate::config::ConfigService`] validates them.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Read the stored value. An empty store reads as `null` or `{}`.
    async fn get(&self) -> Result<serde_json::Value>;
    async fn set(&self, value: serde_json::Value) -> Result<()>;
    /// Watch for changes. `None` means the backend cannot notify.
    fn subscribe(&self, _listener: ChangeListener) -> Option<Subscription> {
        None
    }
    fn name(&self) -> &'static str;
}

type ListenerMap = RwLock<HashMap<u64, ChangeListener>>;

/// In-process backend. Every `set` notifies all listeners synchronously.
pub struct MemoryBackend {
    value: ArcSwap<serde_json::Value>,
    listeners: Arc<ListenerMap>,
    next_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_value(serde_json::Value::Null)
    }

    pub fn with_value(value: serde_json::Value) -> Self {
        Self {
            value: ArcSwap::from_pointee(value),
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Current raw value without going through the async contract.
    pub fn snapshot(&self) -> Arc<serde_json::Value> {
        self.value.load_full()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for l in listeners {
            l();
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigBackend for MemoryBackend {
    async fn get(&self) -> Result<serde_json::Value> {
        Ok(self.value.load().as_ref().clone())
    }

    async fn set(&self, value: serde_json::Value) -> Result<()> {
        self.value.store(Arc::new(value));
        self.notify();
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> Option<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        let listeners = Arc::downgrade(&self.listeners);
        Some(Subscription::new(move || {
            if let Some(map) = listeners.upgrade() {
                map.write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&id);
            }
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn set_notifies_until_unsubscribed() {
        let backend = MemoryBackend::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let sub = backend
            .subscribe(Arc::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .expect("memory backend notifies");

        backend.set(json!({"a": 1})).await.unwrap();
        backend.set(json!({"a": 2})).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        sub.unsubscribe();
        assert_eq!(backend.listener_count(), 0);
        backend.set(json!({"a": 3})).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(backend.get().await.unwrap(), json!({"a": 3}));
    }

    #[tokio::test]
    async fn starts_empty() {
        let backend = MemoryBackend::default();
        assert!(backend.get().await.unwrap().is_null());
        assert_eq!(backend.name(), "memory");
    }
}
