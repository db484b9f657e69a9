//! 插件系统：插件在 setup 阶段注册处理器与模型提供方。
//!
//! # Plugins
//!
//! A [`Plugin`] is set up once, in load order, against a [`PluginContext`].
//! Through the context it may register input processors, output processors
//! and providers, and (when the host enabled it) declare UI widgets.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Plugin`] | Extension unit with an async `setup` |
//! | [`PluginContext`] | Registration surface handed to `setup` |
//! | [`PluginRegistry`] | Processor chains plus the provider table |
//! | [`ConflictPolicy`] | Duplicate provider id handling |
//! | [`FnPlugin`] / [`CompositePlugin`] | Closure and bundle adapters |

mod base;
mod registry;

pub use base::{CompositePlugin, FnPlugin, Plugin, PluginContext, WidgetDecl, WidgetRegistrar};
pub use registry::{ConflictPolicy, PluginRegistry};
