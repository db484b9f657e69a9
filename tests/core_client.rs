//! End-to-end behavior of the core client: init, routing, processors,
//! streaming collection and cancellation.

use airi_core::channel::{handler_fn, ChannelKind, LocalChannel, MessageChannel, MessageEnvelope};
use airi_core::pipeline::FnProcessor;
use airi_core::plugins::FnPlugin;
use airi_core::provider::{ChunkSink, StreamingProvider, UnaryProvider};
use airi_core::{
    Capability, ConflictPolicy, CoreClientBuilder, Error, ModelProvider, Plugin, PluginContext,
    ProviderOutput, ProviderRequest, ProviderResponse, StreamChunk,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

struct Scripted {
    id: &'static str,
    chunks: Vec<StreamChunk>,
}

#[async_trait]
impl StreamingProvider for Scripted {
    fn id(&self) -> &str {
        self.id
    }
    fn kind(&self) -> Capability {
        Capability::Chat
    }
    async fn stream(&self, _req: ProviderRequest, sink: ChunkSink) -> airi_core::Result<()> {
        for chunk in &self.chunks {
            sink.send(chunk.clone()).await?;
        }
        Ok(())
    }
}

struct Labelled {
    id: &'static str,
    label: &'static str,
}

#[async_trait]
impl UnaryProvider for Labelled {
    fn id(&self) -> &str {
        self.id
    }
    fn kind(&self) -> Capability {
        Capability::Tts
    }
    async fn request(&self, req: ProviderRequest) -> airi_core::Result<ProviderResponse> {
        Ok(ProviderResponse::new(req.kind, json!({"by": self.label, "params": req.params})))
    }
}

fn chat_req(params: serde_json::Value) -> ProviderRequest {
    ProviderRequest::new(Capability::Chat, params)
}

#[tokio::test]
async fn request_before_init_is_rejected() {
    let client = CoreClientBuilder::new()
        .provider(ModelProvider::unary(Labelled { id: "tts", label: "x" }))
        .build()
        .unwrap();
    let err = client.request("tts", chat_req(json!(null))).await.unwrap_err();
    assert!(matches!(err, Error::NotInitialized));
    assert!(!client.is_initialized());
}

#[tokio::test]
async fn unknown_provider_runs_no_processors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let plugin: Arc<dyn Plugin> = Arc::new(FnPlugin::new("counting", move |ctx: &mut PluginContext<'_>| {
        let input = counter.clone();
        ctx.register_input_fn("count-in", move |req: ProviderRequest| {
            input.fetch_add(1, Ordering::SeqCst);
            Ok(req)
        });
        let output = counter.clone();
        ctx.register_output_fn("count-out", move |out: ProviderOutput| {
            output.fetch_add(1, Ordering::SeqCst);
            Ok(out)
        });
        Ok(())
    }));

    let client = CoreClientBuilder::new().plugin(plugin).build().unwrap();
    client.init().await.unwrap();

    let err = client.request("nope", chat_req(json!({}))).await.unwrap_err();
    assert!(matches!(err, Error::ProviderNotFound { ref provider_id } if provider_id == "nope"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn input_processors_compose_in_registration_order() {
    let plugin: Arc<dyn Plugin> = Arc::new(FnPlugin::new("wrap", |ctx: &mut PluginContext<'_>| {
        ctx.register_input_fn("f1", |req: ProviderRequest| {
            let inner = req.params.as_str().unwrap_or_default().to_string();
            Ok(req.with_params(json!(format!("f1({inner})"))))
        });
        ctx.register_input_fn("f2", |req: ProviderRequest| {
            let inner = req.params.as_str().unwrap_or_default().to_string();
            Ok(req.with_params(json!(format!("f2({inner})"))))
        });
        Ok(())
    }));

    let client = CoreClientBuilder::new()
        .provider(ModelProvider::unary(Labelled { id: "tts", label: "echo" }))
        .plugin(plugin)
        .build()
        .unwrap();
    client.init().await.unwrap();

    let out = client.request("tts", chat_req(json!("x"))).await.unwrap();
    let resp = out.as_response().expect("unary output");
    assert_eq!(resp.data["params"], json!("f2(f1(x))"));
}

#[tokio::test]
async fn streaming_preserves_order_and_output_chain_sees_chunks() {
    let plugin: Arc<dyn Plugin> = Arc::new(FnPlugin::new("join", |ctx: &mut PluginContext<'_>| {
        ctx.register_output_processor(Arc::new(FnProcessor::new(
            "join-text",
            |out: ProviderOutput| {
                let text = out.text().unwrap_or_default();
                Ok(ProviderOutput::Chunks(vec![json!(text)]))
            },
        )));
        Ok(())
    }));

    let provider = ModelProvider::streaming(Scripted {
        id: "llm",
        chunks: vec![
            StreamChunk::data("a"),
            StreamChunk::data("b"),
            StreamChunk::data("c"),
            StreamChunk::done(),
        ],
    });

    let raw = CoreClientBuilder::new().provider(provider.clone()).build().unwrap();
    raw.init().await.unwrap();
    let out = raw.request("llm", chat_req(json!({}))).await.unwrap();
    assert_eq!(out, ProviderOutput::Chunks(vec![json!("a"), json!("b"), json!("c")]));

    let joined = CoreClientBuilder::new()
        .provider(provider)
        .plugin(plugin)
        .stream_buffer(1)
        .build()
        .unwrap();
    joined.init().await.unwrap();
    let out = joined.request("llm", chat_req(json!({}))).await.unwrap();
    assert_eq!(out, ProviderOutput::Chunks(vec![json!("abc")]));
}

#[tokio::test]
async fn error_chunk_fails_the_whole_request() {
    let client = CoreClientBuilder::new()
        .provider(ModelProvider::streaming(Scripted {
            id: "llm",
            chunks: vec![StreamChunk::data("a"), StreamChunk::error("boom"), StreamChunk::data("b")],
        }))
        .build()
        .unwrap();
    client.init().await.unwrap();

    let err = client.request("llm", chat_req(json!({}))).await.unwrap_err();
    match err {
        Error::ProviderStream { provider_id, error } => {
            assert_eq!(provider_id, "llm");
            assert_eq!(error, json!("boom"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Streams one chunk, signals that it started, then waits forever.
struct Microphone {
    started: Arc<Notify>,
    cancels: Mutex<Vec<String>>,
}

#[async_trait]
impl StreamingProvider for Microphone {
    fn id(&self) -> &str {
        "mic"
    }
    fn kind(&self) -> Capability {
        Capability::Stt
    }
    async fn stream(&self, _req: ProviderRequest, sink: ChunkSink) -> airi_core::Result<()> {
        sink.data("partial").await?;
        self.started.notify_one();
        std::future::pending::<()>().await;
        Ok(())
    }
    fn cancel(&self, reason: &str) {
        self.cancels.lock().unwrap().push(reason.to_string());
    }
    fn supports_cancel(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn cancellation_mid_stream_calls_provider_cancel() {
    let started = Arc::new(Notify::new());
    let mic = Arc::new(Microphone {
        started: started.clone(),
        cancels: Mutex::new(Vec::new()),
    });
    let client = CoreClientBuilder::new()
        .provider(ModelProvider::Streaming(mic.clone()))
        .build()
        .unwrap();
    client.init().await.unwrap();

    let token = CancellationToken::new();
    let req = ProviderRequest::new(Capability::Stt, json!({})).with_cancellation(token.clone());
    let canceller = async {
        started.notified().await;
        token.cancel();
    };
    let (res, ()) = tokio::join!(client.request("mic", req), canceller);

    let err = res.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(*mic.cancels.lock().unwrap(), vec!["cancelled by caller".to_string()]);
}

#[tokio::test]
async fn request_timeout_cancels_hanging_stream() {
    let mic = Arc::new(Microphone {
        started: Arc::new(Notify::new()),
        cancels: Mutex::new(Vec::new()),
    });
    let client = CoreClientBuilder::new()
        .provider(ModelProvider::Streaming(mic.clone()))
        .request_timeout(Duration::from_millis(25))
        .build()
        .unwrap();
    client.init().await.unwrap();
    assert_eq!(client.request_timeout(), Some(Duration::from_millis(25)));

    let err = client
        .request("mic", ProviderRequest::new(Capability::Stt, json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled { ref reason } if reason == "timeout after 25ms"));
    assert_eq!(mic.cancels.lock().unwrap().len(), 1);
}

fn shared_id_plugin(plugin_id: &'static str) -> Arc<dyn Plugin> {
    Arc::new(FnPlugin::new(plugin_id, move |ctx: &mut PluginContext<'_>| {
        ctx.register_provider(ModelProvider::unary(Labelled {
            id: "voice",
            label: plugin_id,
        }))
    }))
}

#[tokio::test]
async fn duplicate_provider_from_later_plugin_is_rejected() {
    let client = CoreClientBuilder::new()
        .plugin(shared_id_plugin("A"))
        .plugin(shared_id_plugin("B"))
        .build()
        .unwrap();

    let err = client.init().await.unwrap_err();
    match &err {
        Error::PluginSetup { plugin_id, source } => {
            assert_eq!(plugin_id, "B");
            assert!(matches!(**source, Error::DuplicateProvider { ref provider_id } if provider_id == "voice"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!client.is_initialized());
}

#[tokio::test]
async fn duplicate_provider_with_replace_binds_later_plugin() {
    let client = CoreClientBuilder::new()
        .plugin(shared_id_plugin("A"))
        .plugin(shared_id_plugin("B"))
        .conflict_policy(ConflictPolicy::Replace)
        .build()
        .unwrap();
    client.init().await.unwrap();

    let out = client
        .request("voice", ProviderRequest::new(Capability::Tts, json!("hi")))
        .await
        .unwrap();
    assert_eq!(out.as_response().unwrap().data["by"], json!("B"));
}

#[tokio::test]
async fn init_is_shared_and_idempotent() {
    let setups = Arc::new(AtomicUsize::new(0));
    let counter = setups.clone();
    let plugin: Arc<dyn Plugin> = Arc::new(FnPlugin::new("once", move |_ctx: &mut PluginContext<'_>| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));
    let client = CoreClientBuilder::new().plugin(plugin).build().unwrap();

    let (a, b) = tokio::join!(client.init(), client.init());
    a.unwrap();
    b.unwrap();
    client.init().await.unwrap();
    assert_eq!(setups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_init_can_be_retried_from_scratch() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let flaky: Arc<dyn Plugin> = Arc::new(FnPlugin::new("flaky", move |_ctx: &mut PluginContext<'_>| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(Error::runtime("not ready yet"))
        } else {
            Ok(())
        }
    }));
    let client = CoreClientBuilder::new()
        .provider(ModelProvider::unary(Labelled { id: "tts", label: "x" }))
        .plugin(flaky)
        .build()
        .unwrap();

    assert!(client.init().await.is_err());
    assert!(client.registry().is_none());

    // A retry that reused the old registry would hit a duplicate "tts".
    client.init().await.unwrap();
    assert_eq!(client.registry().unwrap().provider_ids(), vec!["tts"]);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn widgets_reach_the_registry_only_when_enabled() {
    let plugin: Arc<dyn Plugin> = Arc::new(FnPlugin::new("hud", |ctx: &mut PluginContext<'_>| {
        if let Some(mut widgets) = ctx.widgets() {
            widgets.register(json!({"slot": "overlay"}));
        }
        Ok(())
    }));
    let client = CoreClientBuilder::new()
        .plugin(plugin)
        .enable_widgets(true)
        .build()
        .unwrap();
    client.init().await.unwrap();
    assert_eq!(client.registry().unwrap().widgets().len(), 1);
}

#[tokio::test]
async fn injected_channel_is_exposed() {
    let channel = Arc::new(LocalChannel::sticky());
    let client = CoreClientBuilder::new().channel(channel.clone()).build().unwrap();

    let exposed = client.channel().expect("channel injected");
    assert_eq!(exposed.kind(), ChannelKind::Ipc);
    exposed
        .send(MessageEnvelope::new("scene/update", json!({"model": "vrm"})))
        .await
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = channel
        .on("scene/update", handler_fn(move |msg| sink.lock().unwrap().push(msg.payload)))
        .await;
    assert_eq!(*seen.lock().unwrap(), vec![json!({"model": "vrm"})]);

    let bare = CoreClientBuilder::new().build().unwrap();
    assert!(bare.channel().is_none());
}
