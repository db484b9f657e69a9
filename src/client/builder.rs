use crate::channel::MessageChannel;
use crate::client::core::CoreClient;
use crate::config::{ConfigBackend, ConfigService};
use crate::plugins::{ConflictPolicy, Plugin};
use crate::provider::{DispatchOptions, ModelProvider};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

enum ConfigSource {
    Memory,
    Service(ConfigService),
    Backend(Arc<dyn ConfigBackend>),
    File(PathBuf),
}

/// Builder for [`CoreClient`].
///
/// Keep this surface area small and predictable. Runtime knobs not set here
/// fall back to env:
/// - `AIRI_CORE_REQUEST_TIMEOUT_MS`: per-request deadline (unset or 0 means none)
/// - `AIRI_CORE_STREAM_BUFFER`: chunk channel capacity (default 64)
pub struct CoreClientBuilder {
    config: ConfigSource,
    providers: Vec<ModelProvider>,
    plugins: Vec<Arc<dyn Plugin>>,
    channel: Option<Arc<dyn MessageChannel>>,
    conflict_policy: ConflictPolicy,
    widgets: bool,
    request_timeout: Option<Duration>,
    stream_buffer: Option<usize>,
}

impl CoreClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigSource::Memory,
            providers: Vec::new(),
            plugins: Vec::new(),
            channel: None,
            conflict_policy: ConflictPolicy::default(),
            widgets: false,
            request_timeout: None,
            stream_buffer: None,
        }
    }

    /// Use an already constructed config service.
    pub fn config_service(mut self, service: ConfigService) -> Self {
        self.config = ConfigSource::Service(service);
        self
    }

    /// Back the config service with a custom storage backend.
    pub fn config_backend(mut self, backend: Arc<dyn ConfigBackend>) -> Self {
        self.config = ConfigSource::Backend(backend);
        self
    }

    /// Persist configuration in a JSON or YAML file (chosen by extension).
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = ConfigSource::File(path.into());
        self
    }

    /// Provider registered during `init()`, before any plugin is set up.
    pub fn provider(mut self, provider: ModelProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Plugin set up during `init()`, in the order added.
    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn channel(mut self, channel: Arc<dyn MessageChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// How duplicate provider ids are handled. Default is [`ConflictPolicy::Reject`].
    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Let plugins declare UI widgets through their setup context.
    pub fn enable_widgets(mut self, enable: bool) -> Self {
        self.widgets = enable;
        self
    }

    /// Deadline for each provider call. Elapsing fires the request's cancellation
    /// token; unary calls still run to completion.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Capacity of the bounded channel carrying stream chunks.
    pub fn stream_buffer(mut self, n: usize) -> Self {
        self.stream_buffer = Some(n.max(1));
        self
    }

    /// Build the client. Nothing is registered until `init()`.
    pub fn build(self) -> Result<CoreClient> {
        let config = match self.config {
            ConfigSource::Memory => ConfigService::in_memory()?,
            ConfigSource::Service(service) => service,
            ConfigSource::Backend(backend) => ConfigService::new(backend)?,
            ConfigSource::File(path) => ConfigService::file(path)?,
        };

        let timeout = self.request_timeout.or_else(|| {
            std::env::var("AIRI_CORE_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
        });
        let buffer = self
            .stream_buffer
            .or_else(|| {
                std::env::var("AIRI_CORE_STREAM_BUFFER")
                    .ok()?
                    .parse::<usize>()
                    .ok()
            })
            .map(|n| n.max(1))
            .unwrap_or(DispatchOptions::default().buffer);

        tracing::debug!(
            backend = config.backend().name(),
            providers = self.providers.len(),
            plugins = self.plugins.len(),
            ?timeout,
            buffer,
            "core client built"
        );

        Ok(CoreClient {
            config,
            channel: self.channel,
            providers: self.providers,
            plugins: self.plugins,
            conflict_policy: self.conflict_policy,
            widgets: self.widgets,
            dispatch: DispatchOptions { timeout, buffer },
            registry: tokio::sync::OnceCell::new(),
        })
    }
}

impl Default for CoreClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
