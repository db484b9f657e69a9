//! Config service behavior through the public API, including the file backend
//! wired in by the client builder.

use airi_core::config::{
    ConfigBackend, FileBackend, MemoryBackend, ProviderBinding, ProviderRef, ProvidersConfig,
    SceneConfig, SceneModel, TtsProviderRef,
};
use airi_core::{Config, ConfigService, CoreClientBuilder, Error};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn sample() -> Config {
    Config {
        providers: ProvidersConfig {
            chat: Some(
                ProviderRef::new("openai")
                    .with_base_url("https://api.openai.com/v1")
                    .with_api_key("sk-test"),
            ),
            tts: Some(TtsProviderRef {
                id: "elevenlabs".into(),
                voice: Some("aria".into()),
            }),
            stt: Some(ProviderBinding::new("whisper")),
            vad: None,
        },
        scene: SceneConfig {
            model: SceneModel::Live2d,
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let service = ConfigService::in_memory().unwrap();
    service.set(&sample()).await.unwrap();
    assert_eq!(service.get().await.unwrap(), sample());
}

#[tokio::test]
async fn unknown_top_level_key_is_rejected_and_not_written() {
    let backend = Arc::new(MemoryBackend::new());
    let service = ConfigService::new(backend.clone()).unwrap();

    let mut raw = serde_json::to_value(sample()).unwrap();
    raw["telemetry"] = json!(true);
    let err = service.set_raw(raw).await.unwrap_err();

    let issues = err.validation_issues().expect("validation error");
    assert!(!issues.is_empty());
    assert!(backend.snapshot().is_null());
}

#[tokio::test]
async fn empty_store_fails_validation() {
    let service = ConfigService::in_memory().unwrap();
    let err = service.get().await.unwrap_err();
    assert!(matches!(err, Error::ConfigValidation { .. }));
}

#[tokio::test]
async fn subscribers_hear_every_write_until_dropped() {
    let service = ConfigService::in_memory().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let sub = service.subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(!sub.is_noop());

    service.set(&sample()).await.unwrap();
    service.set(&sample()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    drop(sub);
    service.set(&sample()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn client_config_file_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runtime").join("airi.yaml");

    let client = CoreClientBuilder::new().config_file(&path).build().unwrap();
    client.config().set(&sample()).await.unwrap();

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains("baseUrl"));

    let raw = FileBackend::new(&path).get().await.unwrap();
    assert_eq!(raw["providers"]["chat"]["id"], json!("openai"));

    let reopened = ConfigService::file(&path).unwrap();
    assert_eq!(reopened.get().await.unwrap(), sample());
}

#[test]
fn schema_is_closed_at_the_root() {
    let service = ConfigService::in_memory().unwrap();
    let schema = service.json_schema();
    assert_eq!(schema["additionalProperties"], json!(false));
    let required = schema["required"].as_array().unwrap();
    assert!(required.contains(&json!("providers")));
    assert!(required.contains(&json!("scene")));
}
