use crate::channel::MessageChannel;
use crate::config::ConfigService;
use crate::plugins::{ConflictPolicy, Plugin, PluginRegistry};
use crate::provider::{dispatch, DispatchOptions, ModelProvider};
use crate::types::{ProviderOutput, ProviderRequest};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::Instrument;
use uuid::Uuid;

/// Orchestrates provider requests through the plugin-contributed processor chains.
///
/// Built by [`CoreClientBuilder`](crate::client::CoreClientBuilder). The
/// registry is populated once by [`CoreClient::init`] and is read-only from
/// then on, so a client can be shared behind an `Arc` and serve concurrent
/// requests.
pub struct CoreClient {
    pub(crate) config: ConfigService,
    pub(crate) channel: Option<Arc<dyn MessageChannel>>,
    pub(crate) providers: Vec<ModelProvider>,
    pub(crate) plugins: Vec<Arc<dyn Plugin>>,
    pub(crate) conflict_policy: ConflictPolicy,
    pub(crate) widgets: bool,
    pub(crate) dispatch: DispatchOptions,
    pub(crate) registry: OnceCell<Arc<PluginRegistry>>,
}

impl CoreClient {
    /// Register configured providers, then set up plugins in order.
    ///
    /// Idempotent: concurrent callers share one initialization and later calls
    /// return immediately. If initialization fails nothing is kept, and the
    /// next call starts again from an empty registry.
    pub async fn init(&self) -> Result<&Self> {
        self.registry
            .get_or_try_init(|| self.build_registry())
            .await?;
        Ok(self)
    }

    async fn build_registry(&self) -> Result<Arc<PluginRegistry>> {
        let mut registry = PluginRegistry::new().with_conflict_policy(self.conflict_policy);
        if self.widgets {
            registry = registry.with_widgets();
        }
        for provider in &self.providers {
            registry.register_provider(provider.clone())?;
        }
        registry.load(&self.plugins).await?;

        tracing::info!(
            providers = ?registry.provider_ids(),
            plugins = registry.loaded_plugins().len(),
            input_processors = registry.input_processors().len(),
            output_processors = registry.output_processors().len(),
            "core client initialized"
        );
        Ok(Arc::new(registry))
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.initialized()
    }

    /// Route `req` to the provider registered as `provider_id`.
    ///
    /// Steps: resolve, input processors, dispatch, output processors. An
    /// unknown provider fails before any processor runs.
    pub async fn request(&self, provider_id: &str, req: ProviderRequest) -> Result<ProviderOutput> {
        let registry = self.registry.get().ok_or(Error::NotInitialized)?;
        let span = tracing::debug_span!(
            "core_request",
            request_id = %Uuid::new_v4(),
            provider_id,
            kind = %req.kind,
        );
        self.execute(registry, provider_id, req).instrument(span).await
    }

    async fn execute(
        &self,
        registry: &PluginRegistry,
        provider_id: &str,
        req: ProviderRequest,
    ) -> Result<ProviderOutput> {
        let provider = registry
            .get_provider(provider_id)
            .cloned()
            .ok_or_else(|| Error::ProviderNotFound {
                provider_id: provider_id.to_string(),
            })?;
        if provider.kind() != req.kind {
            tracing::debug!(
                provider_kind = %provider.kind(),
                request_kind = %req.kind,
                "request kind differs from provider kind"
            );
        }

        let req = registry.apply_input(req).await?;
        let raw = dispatch(&provider, req, self.dispatch).await?;
        let out = registry.apply_output(raw).await?;
        tracing::debug!(streaming = provider.is_streaming(), "request completed");
        Ok(out)
    }

    /// The frozen registry, once `init()` has succeeded.
    pub fn registry(&self) -> Option<&Arc<PluginRegistry>> {
        self.registry.get()
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn channel(&self) -> Option<&Arc<dyn MessageChannel>> {
        self.channel.as_ref()
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.dispatch.timeout
    }

    pub fn stream_buffer(&self) -> usize {
        self.dispatch.buffer
    }
}

impl std::fmt::Debug for CoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreClient")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .field("plugins", &self.plugins.iter().map(|p| p.id()).collect::<Vec<_>>())
            .field("conflict_policy", &self.conflict_policy)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
