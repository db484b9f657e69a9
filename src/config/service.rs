//! Validating facade over a config backend.

use super::backend::{ConfigBackend, MemoryBackend};
use super::file::FileBackend;
use super::schema::{Config, ConfigValidator};
use crate::types::Subscription;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Reads and writes [`Config`] through a backend, validating both directions.
#[derive(Clone)]
pub struct ConfigService {
    backend: Arc<dyn ConfigBackend>,
    validator: Arc<ConfigValidator>,
}

impl ConfigService {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Result<Self> {
        Ok(Self {
            backend,
            validator: ConfigValidator::shared()?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(Arc::new(FileBackend::new(path)))
    }

    pub fn backend(&self) -> &Arc<dyn ConfigBackend> {
        &self.backend
    }

    pub fn json_schema(&self) -> &serde_json::Value {
        self.validator.json_schema()
    }

    /// Validate a raw value without touching the backend.
    pub fn validate(&self, raw: &serde_json::Value) -> Result<Config> {
        self.validator.validate(raw)
    }

    /// Read and validate the stored config. An empty store is treated as `{}`.
    pub async fn get(&self) -> Result<Config> {
        let mut raw = self.backend.get().await?;
        if raw.is_null() {
            raw = serde_json::Value::Object(Default::default());
        }
        self.validator.validate(&raw)
    }

    /// Validate then persist. Nothing is written when validation fails.
    pub async fn set(&self, next: &Config) -> Result<()> {
        let raw = serde_json::to_value(next)?;
        self.set_raw(raw).await.map(|_| ())
    }

    /// Validate an untyped value, then persist its normalized form (defaults applied).
    pub async fn set_raw(&self, raw: serde_json::Value) -> Result<Config> {
        let parsed = self.validator.validate(&raw)?;
        self.backend.set(serde_json::to_value(&parsed)?).await?;
        tracing::debug!(backend = self.backend.name(), "config persisted");
        Ok(parsed)
    }

    /// Forward backend change notifications. Returns a no-op handle when the
    /// backend cannot notify. Events are neither debounced nor coalesced.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.backend
            .subscribe(Arc::new(listener))
            .unwrap_or_else(Subscription::noop)
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("backend", &self.backend.name())
            .finish()
    }
}
