/*!
 * Tests for the batch orchestrator and the incremental translator
 */

use std::sync::Arc;
use tokio::sync::mpsc;

use capwai::errors::{ConfigError, TranslationError};
use capwai::providers::mock::MockBackend;
use capwai::translation::events::{ChannelSink, RecordingSink};
use capwai::translation::orchestrator::{
    export_file_name, STATUS_CACHE_HIT, STATUS_READY, STATUS_READY_CACHED, STATUS_READY_SAVED,
};
use capwai::translation::{
    fingerprint, BatchOrchestrator, IncrementalTranslator, MemoryStore, ModeConfig, PromptBuilder, ResultCache,
    SpeedMode, TranslationEvent,
};
use crate::common;

fn prompts() -> PromptBuilder {
    PromptBuilder::new("English", "Korean")
}

fn orchestrator(backend: &MockBackend, store: &MemoryStore) -> (BatchOrchestrator, RecordingSink) {
    let sink = RecordingSink::new();
    let orchestrator = BatchOrchestrator::new(
        Arc::new(backend.clone()),
        ResultCache::new(Arc::new(store.clone())),
        prompts(),
    )
    .with_sink(Arc::new(sink.clone()));
    (orchestrator, sink)
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_stableThenCached_shouldCallBackendOnce() {
    common::init_logging();
    let backend = MockBackend::working();
    let store = MemoryStore::new();
    let items = common::sample_captions(120);
    let mode = ModeConfig::for_mode(SpeedMode::Stable);

    let (first_run, first_sink) = orchestrator(&backend, &store);
    let translated = first_run.translate_batch(&items, &mode).await.unwrap();

    assert_eq!(backend.call_count(), 3);
    assert_eq!(translated.len(), 120);
    assert_eq!(first_sink.progress(), vec![0, 33, 67]);
    assert_eq!(first_sink.statuses().first().map(String::as_str), Some("Translating... 0% (Stable)"));
    assert_eq!(first_sink.statuses().last().map(String::as_str), Some(STATUS_READY_SAVED));

    let (second_run, second_sink) = orchestrator(&backend, &store);
    let cached = second_run.translate_batch(&items, &mode).await.unwrap();

    assert_eq!(backend.call_count(), 3);
    assert_eq!(cached, translated);
    assert_eq!(
        second_sink.events(),
        vec![
            TranslationEvent::Status(STATUS_CACHE_HIT.to_string()),
            TranslationEvent::Complete(translated.clone()),
            TranslationEvent::Status(STATUS_READY_CACHED.to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withOneFailingChunk_shouldReturnPartialAndSkipCache() {
    // 150 captions in chunks of 50: the chunk holding caption 60 fails
    let backend = MockBackend::fail_on("caption number 60\"");
    let store = MemoryStore::new();
    let items = common::sample_captions(150);
    let mode = ModeConfig::for_mode(SpeedMode::Fast);

    let (orchestrator, sink) = orchestrator(&backend, &store);
    let result = orchestrator.translate_batch(&items, &mode).await.unwrap();

    assert_eq!(result.len(), 150);
    assert!(result[..50].iter().all(|c| c.text.starts_with("[translated]")));
    assert_eq!(result[50..100], items[50..100]);
    assert!(result[100..].iter().all(|c| c.text.starts_with("[translated]")));
    assert!(store.is_empty());
    assert_eq!(sink.statuses().last().map(String::as_str), Some(STATUS_READY));
    assert!(sink.statuses().iter().any(|s| s.ends_with("(Fast)")));
}

#[tokio::test]
async fn test_translateBatch_withUnconfiguredBackend_shouldFailBeforeCache() {
    let backend = MockBackend::unconfigured();
    let store = MemoryStore::new();
    let items = common::sample_captions(3);
    ResultCache::new(Arc::new(store.clone()))
        .put(&fingerprint(&items), &items)
        .await;

    let (orchestrator, sink) = orchestrator(&backend, &store);
    let result = orchestrator.translate_batch(&items, &ModeConfig::default()).await;

    assert!(matches!(
        result,
        Err(TranslationError::Config(ConfigError::MissingCredentials { .. }))
    ));
    assert_eq!(sink.events(), vec![TranslationEvent::Error("No API Key".to_string())]);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_translateBatch_withEmptyInput_shouldCompleteWithoutCalls() {
    let backend = MockBackend::working();
    let store = MemoryStore::new();

    let (orchestrator, sink) = orchestrator(&backend, &store);
    let result = orchestrator.translate_batch(&[], &ModeConfig::default()).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(sink.events(), vec![TranslationEvent::Complete(Vec::new())]);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withExportDir_shouldWriteLectureFile() {
    let temp_dir = common::create_temp_dir().unwrap();
    let backend = MockBackend::working();
    let store = MemoryStore::new();
    let items = common::sample_captions(4);

    let (orchestrator, _sink) = orchestrator(&backend, &store);
    let orchestrator = orchestrator.with_export_dir(temp_dir.path(), "ko");
    let translated = orchestrator.translate_batch(&items, &ModeConfig::default()).await.unwrap();

    let exported = temp_dir.path().join(export_file_name(&fingerprint(&items), "ko"));
    let content = std::fs::read_to_string(exported).unwrap();
    assert_eq!(capwai::captions::captions_from_json(&content).unwrap(), translated);
}

#[tokio::test]
async fn test_events_throughChannel_shouldArriveInOrder() {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let backend = MockBackend::working();
    let orchestrator = BatchOrchestrator::new(
        Arc::new(backend),
        ResultCache::disabled(),
        prompts(),
    )
    .with_sink(Arc::new(ChannelSink::new(sender)));

    let items = common::sample_captions(2);
    orchestrator
        .translate_batch(&items, &ModeConfig::custom(50, 1, 0))
        .await
        .unwrap();
    drop(orchestrator);

    let mut kinds = Vec::new();
    while let Some(event) = receiver.recv().await {
        kinds.push(event.kind());
    }
    assert_eq!(kinds, vec!["progress", "status-update", "complete", "status-update"]);
}

#[tokio::test]
async fn test_translateOne_shouldUseContextPromptAndCache() {
    let backend = MockBackend::working().with_tag("[ko]");
    let sink = RecordingSink::new();
    let translator =
        IncrementalTranslator::new(Arc::new(backend.clone()), prompts()).with_sink(Arc::new(sink.clone()));

    let first = translator
        .translate_one("the loss goes down", "we train the model", "after many epochs")
        .await
        .unwrap();
    let second = translator.translate_one("the loss goes down", "", "").await.unwrap();

    assert_eq!(first, "[ko] the loss goes down");
    assert_eq!(second, first);
    assert_eq!(backend.call_count(), 1);
    let prompt = &backend.prompts()[0];
    assert!(prompt.contains("we train the model"));
    assert!(prompt.contains("after many epochs"));
    assert_eq!(sink.events(), vec![TranslationEvent::Subtitle(first)]);
}

#[tokio::test]
async fn test_translateOne_withWhitespaceBackendReply_shouldFail() {
    let translator = IncrementalTranslator::new(Arc::new(MockBackend::empty()), prompts());

    let result = translator.translate_one("hello", "", "").await;

    assert!(matches!(result, Err(TranslationError::EmptyTranslation)));
    assert!(translator.cache().is_empty());
}
