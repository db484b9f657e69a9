//! Base plugin types.

use super::registry::PluginRegistry;
use crate::pipeline::{FnProcessor, Processor};
use crate::provider::ModelProvider;
use crate::types::{ProviderOutput, ProviderRequest};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A unit of extension. During `setup` it registers processors and providers
/// through the [`PluginContext`] it is given.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn id(&self) -> &str;
    async fn setup(&self, ctx: &mut PluginContext<'_>) -> Result<()>;
}

/// Capability surface handed to a plugin during setup.
///
/// Plugins never see the registry itself, only these registration methods.
pub struct PluginContext<'a> {
    registry: &'a mut PluginRegistry,
    plugin_id: &'a str,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(registry: &'a mut PluginRegistry, plugin_id: &'a str) -> Self {
        Self {
            registry,
            plugin_id,
        }
    }

    pub fn plugin_id(&self) -> &str {
        self.plugin_id
    }

    pub fn register_input_processor(&mut self, processor: Arc<dyn Processor<ProviderRequest>>) {
        self.registry.register_input_processor(processor);
    }

    pub fn register_output_processor(&mut self, processor: Arc<dyn Processor<ProviderOutput>>) {
        self.registry.register_output_processor(processor);
    }

    /// Register a synchronous request transform.
    pub fn register_input_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(ProviderRequest) -> Result<ProviderRequest> + Send + Sync + 'static,
    {
        self.register_input_processor(Arc::new(FnProcessor::new(name, func)));
    }

    /// Register a synchronous result transform.
    pub fn register_output_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(ProviderOutput) -> Result<ProviderOutput> + Send + Sync + 'static,
    {
        self.register_output_processor(Arc::new(FnProcessor::new(name, func)));
    }

    /// Subject to the registry's conflict policy.
    pub fn register_provider(&mut self, provider: ModelProvider) -> Result<()> {
        self.registry.register_provider(provider)
    }

    /// Explicit override: always binds `provider` to its id.
    pub fn replace_provider(&mut self, provider: ModelProvider) -> Option<ModelProvider> {
        self.registry.replace_provider(provider)
    }

    /// Widget extension, present only when the host enabled it.
    pub fn widgets(&mut self) -> Option<WidgetRegistrar<'_>> {
        let plugin_id = self.plugin_id;
        self.registry
            .widget_table_mut()
            .map(|widgets| WidgetRegistrar { widgets, plugin_id })
    }
}

/// UI widget metadata declared by a plugin. The core stores it and never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDecl {
    pub plugin_id: String,
    pub decl: serde_json::Value,
}

pub struct WidgetRegistrar<'a> {
    widgets: &'a mut Vec<WidgetDecl>,
    plugin_id: &'a str,
}

impl WidgetRegistrar<'_> {
    pub fn register(&mut self, decl: serde_json::Value) {
        self.widgets.push(WidgetDecl {
            plugin_id: self.plugin_id.to_string(),
            decl,
        });
    }
}

/// Plugin whose setup is a plain closure.
pub struct FnPlugin<F> {
    id: String,
    setup: F,
}

impl<F> FnPlugin<F>
where
    F: for<'c, 'r> Fn(&'c mut PluginContext<'r>) -> Result<()> + Send + Sync,
{
    pub fn new(id: impl Into<String>, setup: F) -> Self {
        Self {
            id: id.into(),
            setup,
        }
    }
}

#[async_trait]
impl<F> Plugin for FnPlugin<F>
where
    F: for<'c, 'r> Fn(&'c mut PluginContext<'r>) -> Result<()> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn setup(&self, ctx: &mut PluginContext<'_>) -> Result<()> {
        (self.setup)(ctx)
    }
}

/// Several plugins set up in order under one id.
pub struct CompositePlugin {
    id: String,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl CompositePlugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugins: Vec::new(),
        }
    }
    pub fn add(mut self, p: Arc<dyn Plugin>) -> Self {
        self.plugins.push(p);
        self
    }
    pub fn len(&self) -> usize {
        self.plugins.len()
    }
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[async_trait]
impl Plugin for CompositePlugin {
    fn id(&self) -> &str {
        &self.id
    }

    async fn setup(&self, ctx: &mut PluginContext<'_>) -> Result<()> {
        for p in &self.plugins {
            p.setup(ctx).await?;
        }
        Ok(())
    }
}
