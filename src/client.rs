//! Core client: composes configuration, plugins, providers and the message channel.
//!
//! Keep the public surface small: build a [`CoreClient`] with
//! [`CoreClientBuilder`], call `init()` once, then issue `request()`s.

pub mod builder;
pub mod core;

pub use builder::CoreClientBuilder;
pub use core::CoreClient;
