use super::{AsyncFnProcessor, FnProcessor, Processor, ProcessorChain};
use crate::types::{Capability, ProviderRequest};
use crate::Error;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_chain_is_a_fold_in_registration_order() {
    let mut chain: ProcessorChain<String> = ProcessorChain::new();
    chain.push(Arc::new(FnProcessor::new("f1", |s: String| Ok(format!("f1({})", s)))));
    chain.push(Arc::new(FnProcessor::new("f2", |s: String| Ok(format!("f2({})", s)))));

    assert_eq!(chain.apply("x".to_string()).await.unwrap(), "f2(f1(x))");
    assert_eq!(chain.names(), vec!["f1", "f2"]);
}

#[tokio::test]
async fn test_empty_chain_is_identity() {
    let chain: ProcessorChain<u32> = ProcessorChain::default();
    assert!(chain.is_empty());
    assert_eq!(chain.apply(7).await.unwrap(), 7);
}

#[tokio::test]
async fn test_async_processor_awaits_before_next() {
    let mut chain: ProcessorChain<ProviderRequest> = ProcessorChain::new();
    chain.push(Arc::new(AsyncFnProcessor::new(
        "slow-tag",
        |mut req: ProviderRequest| async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            req.params["tags"] = json!(["slow"]);
            Ok(req)
        },
    )));
    chain.push(Arc::new(FnProcessor::new("append", |mut req: ProviderRequest| {
        let tags = req.params["tags"].as_array().cloned().unwrap_or_default();
        let mut tags = tags;
        tags.push(json!("fast"));
        req.params["tags"] = json!(tags);
        Ok(req)
    })));

    let out = chain
        .apply(ProviderRequest::new(Capability::Chat, json!({})))
        .await
        .unwrap();
    assert_eq!(out.params["tags"], json!(["slow", "fast"]));
}

#[tokio::test]
async fn test_duplicates_run_once_per_registration() {
    let counter = Arc::new(AtomicUsize::new(0));
    let c = counter.clone();
    let proc: Arc<dyn Processor<u32>> = Arc::new(FnProcessor::new("count", move |x: u32| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(x + 1)
    }));
    let mut chain = ProcessorChain::new();
    chain.push(proc.clone());
    chain.push(proc);
    assert_eq!(chain.apply(0).await.unwrap(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failure_aborts_remaining_processors() {
    let after = Arc::new(AtomicUsize::new(0));
    let a = after.clone();
    let mut chain: ProcessorChain<u32> = ProcessorChain::new();
    chain.push(Arc::new(FnProcessor::new("reject", |_x: u32| {
        Err(Error::processor("reject", "value refused"))
    })));
    chain.push(Arc::new(FnProcessor::new("after", move |x: u32| {
        a.fetch_add(1, Ordering::SeqCst);
        Ok(x)
    })));

    let err = chain.apply(1).await.unwrap_err();
    assert!(matches!(err, Error::Processor { ref name, .. } if name == "reject"));
    assert_eq!(after.load(Ordering::SeqCst), 0);
}
