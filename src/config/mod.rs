//! 配置模块：严格校验并持久化运行时配置。
//!
//! # Config Module
//!
//! Schema-validated configuration describing which provider serves which
//! capability, plus scene defaults.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Config`] | Typed configuration document |
//! | [`ConfigValidator`] | Compiled JSON Schema (generated from [`Config`]) plus semantic checks |
//! | [`ConfigService`] | Validating read/write facade over a backend |
//! | [`ConfigBackend`] | Raw storage contract |
//! | [`MemoryBackend`] | In-process backend with change notification |
//! | [`FileBackend`] | JSON/YAML file backend watched with `notify` |
//!
//! Validation is strict: unknown keys are rejected, and a failed validation
//! never yields a partially-valid value.

mod backend;
mod file;
mod schema;
mod service;

pub use backend::{ChangeListener, ConfigBackend, MemoryBackend};
pub use file::{FileBackend, FileFormat};
pub use schema::{
    Config, ConfigValidator, ProviderBinding, ProviderRef, ProvidersConfig, Renderer,
    SceneConfig, SceneModel, TtsProviderRef, ValidationIssue,
};
pub use service::ConfigService;
