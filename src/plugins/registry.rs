//! Plugin registry.

use super::base::{Plugin, PluginContext, WidgetDecl};
use crate::pipeline::{Processor, ProcessorChain};
use crate::provider::ModelProvider;
use crate::types::{ProviderOutput, ProviderRequest};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// What happens when a provider id is registered twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail with [`Error::DuplicateProvider`]; the first registration stays bound.
    #[default]
    Reject,
    /// The later registration wins.
    Replace,
}

/// Owns the processor chains and the provider table.
///
/// Mutation needs `&mut self`, so once the client freezes the registry behind
/// an `Arc` after init, concurrent requests only ever read it.
pub struct PluginRegistry {
    input: ProcessorChain<ProviderRequest>,
    output: ProcessorChain<ProviderOutput>,
    providers: HashMap<String, ModelProvider>,
    conflict_policy: ConflictPolicy,
    widgets: Option<Vec<WidgetDecl>>,
    loaded: Vec<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            input: ProcessorChain::new(),
            output: ProcessorChain::new(),
            providers: HashMap::new(),
            conflict_policy: ConflictPolicy::default(),
            widgets: None,
            loaded: Vec::new(),
        }
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Enable the widget extension of [`PluginContext`].
    pub fn with_widgets(mut self) -> Self {
        self.widgets.get_or_insert_with(Vec::new);
        self
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    pub fn register_provider(&mut self, provider: ModelProvider) -> Result<()> {
        let id = provider.id().to_string();
        if self.providers.contains_key(&id) {
            match self.conflict_policy {
                ConflictPolicy::Reject => {
                    return Err(Error::DuplicateProvider { provider_id: id });
                }
                ConflictPolicy::Replace => {
                    tracing::warn!(provider = %id, "replacing previously registered provider");
                }
            }
        }
        tracing::debug!(
            provider = %id,
            kind = %provider.kind(),
            streaming = provider.is_streaming(),
            "provider registered"
        );
        self.providers.insert(id, provider);
        Ok(())
    }

    /// Bind `provider` regardless of policy, returning whatever it displaced.
    pub fn replace_provider(&mut self, provider: ModelProvider) -> Option<ModelProvider> {
        let id = provider.id().to_string();
        let previous = self.providers.insert(id.clone(), provider);
        if previous.is_some() {
            tracing::debug!(provider = %id, "provider explicitly replaced");
        }
        previous
    }

    pub fn register_input_processor(&mut self, processor: Arc<dyn Processor<ProviderRequest>>) {
        self.input.push(processor);
    }

    pub fn register_output_processor(&mut self, processor: Arc<dyn Processor<ProviderOutput>>) {
        self.output.push(processor);
    }

    pub fn get_provider(&self, id: &str) -> Option<&ModelProvider> {
        self.providers.get(id)
    }

    pub fn has_provider(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Registered provider ids, sorted.
    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn input_processors(&self) -> &ProcessorChain<ProviderRequest> {
        &self.input
    }

    pub fn output_processors(&self) -> &ProcessorChain<ProviderOutput> {
        &self.output
    }

    pub async fn apply_input(&self, req: ProviderRequest) -> Result<ProviderRequest> {
        self.input.apply(req).await
    }

    pub async fn apply_output(&self, out: ProviderOutput) -> Result<ProviderOutput> {
        self.output.apply(out).await
    }

    /// Run each plugin's `setup` in order, awaiting one before the next.
    ///
    /// Fail-fast and non-atomic: a failing plugin stops the load with
    /// [`Error::PluginSetup`], and everything registered before the failure
    /// (by earlier plugins and by the failing one) stays registered.
    pub async fn load(&mut self, plugins: &[Arc<dyn Plugin>]) -> Result<()> {
        for plugin in plugins {
            let id = plugin.id().to_string();
            tracing::debug!(plugin = %id, "setting up plugin");
            let mut ctx = PluginContext::new(self, &id);
            if let Err(e) = plugin.setup(&mut ctx).await {
                tracing::warn!(plugin = %id, error = %e, "plugin setup failed");
                return Err(Error::PluginSetup {
                    plugin_id: id,
                    source: Box::new(e),
                });
            }
            self.loaded.push(id);
        }
        Ok(())
    }

    /// Ids of plugins whose setup completed, in load order.
    pub fn loaded_plugins(&self) -> &[String] {
        &self.loaded
    }

    /// Declared widgets; empty when the extension is disabled.
    pub fn widgets(&self) -> &[WidgetDecl] {
        self.widgets.as_deref().unwrap_or(&[])
    }

    pub fn widgets_enabled(&self) -> bool {
        self.widgets.is_some()
    }

    pub(crate) fn widget_table_mut(&mut self) -> Option<&mut Vec<WidgetDecl>> {
        self.widgets.as_mut()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
