//! 处理链模块：按注册顺序依次执行的请求/结果变换器。
//!
//! # Processor Chains
//!
//! Plugins contribute processors that transform requests before dispatch
//! (input) and results after dispatch (output). A chain is a single-pass
//! fold: each processor consumes the previous processor's output, in
//! registration order.
//!
//! ```text
//! value → p1 → p2 → … → pn → value'
//! ```
//!
//! The first failing processor aborts the chain and its error is returned
//! unchanged; no partial result escapes.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Processor`] | Async transform trait |
//! | [`FnProcessor`] | Adapter for synchronous closures |
//! | [`AsyncFnProcessor`] | Adapter for closures returning futures |
//! | [`ProcessorChain`] | Ordered sequence applied as a fold |
//!
//! ## Example
//!
//! ```rust
//! use airi_core::pipeline::{FnProcessor, ProcessorChain};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let mut chain: ProcessorChain<i64> = ProcessorChain::new();
//! chain.push(Arc::new(FnProcessor::new("add-one", |x: i64| Ok(x + 1))));
//! chain.push(Arc::new(FnProcessor::new("double", |x: i64| Ok(x * 2))));
//! assert_eq!(chain.apply(3).await.unwrap(), 8);
//! # });
//! ```

#[cfg(test)]
mod tests;

use crate::Result;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Core transformer interface shared by input and output processors.
#[async_trait]
pub trait Processor<T: Send + 'static>: Send + Sync {
    async fn process(&self, value: T) -> Result<T>;

    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Wraps a synchronous closure.
pub struct FnProcessor<F> {
    name: String,
    func: F,
}

impl<F> FnProcessor<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<T, F> Processor<T> for FnProcessor<F>
where
    T: Send + 'static,
    F: Fn(T) -> Result<T> + Send + Sync,
{
    async fn process(&self, value: T) -> Result<T> {
        (self.func)(value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wraps a closure that returns a future.
pub struct AsyncFnProcessor<F, Fut> {
    name: String,
    func: F,
    _fut: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncFnProcessor<F, Fut> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _fut: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> Processor<T> for AsyncFnProcessor<F, Fut>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    async fn process(&self, value: T) -> Result<T> {
        (self.func)(value).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered processor sequence. Duplicates are allowed and run once per registration.
pub struct ProcessorChain<T: Send + 'static> {
    processors: Vec<Arc<dyn Processor<T>>>,
}

impl<T: Send + 'static> ProcessorChain<T> {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn push(&mut self, processor: Arc<dyn Processor<T>>) {
        self.processors.push(processor);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.processors.iter().map(|p| p.name().to_string()).collect()
    }

    /// Run every processor in registration order, each on the previous output.
    pub async fn apply(&self, value: T) -> Result<T> {
        let mut current = value;
        for (index, processor) in self.processors.iter().enumerate() {
            current = match processor.process(current).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(
                        processor = processor.name(),
                        index,
                        error = %e,
                        "processor failed, aborting chain"
                    );
                    return Err(e);
                }
            };
        }
        Ok(current)
    }
}

impl<T: Send + 'static> Default for ProcessorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Clone for ProcessorChain<T> {
    fn clone(&self) -> Self {
        Self {
            processors: self.processors.clone(),
        }
    }
}
