/*!
 * Tests for the result cache and the sentence cache
 */

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use capwai::errors::CacheError;
use capwai::translation::{fingerprint, KeyValueStore, MemoryStore, ResultCache, SentenceCache};
use crate::common;

/// Store whose every operation fails
struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
        Err(CacheError::Storage("disk unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), CacheError> {
        Err(CacheError::Storage("disk unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Storage("disk unavailable".to_string()))
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>, CacheError> {
        Err(CacheError::Storage("disk unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_putThenGet_shouldReturnSameItems() {
    let cache = ResultCache::new(Arc::new(MemoryStore::new()));
    let items = common::sample_captions(4);
    let fp = fingerprint(&items);

    cache.put(&fp, &items).await;
    let entry = cache.get(&fp).await.expect("entry should be cached");

    assert_eq!(entry.items, items);
    assert_eq!(entry.fingerprint, fp);
    assert!(entry.created_at().is_some());
}

#[tokio::test]
async fn test_put_shouldUseLecturePrefixedKey() {
    let store = MemoryStore::new();
    let cache = ResultCache::new(Arc::new(store.clone()));
    let items = common::sample_captions(1);
    let fp = fingerprint(&items);

    cache.put(&fp, &items).await;

    let key = format!("lecture_{}", fp);
    let stored = store.get(&key).await.unwrap().expect("value under lecture_ key");
    assert!(stored.get("captions").is_some());
    assert!(stored.get("timestamp").is_some());
}

#[tokio::test]
async fn test_namespaces_shouldNotSeeEachOther() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let korean = ResultCache::new(store.clone()).with_namespace("ko");
    let japanese = ResultCache::new(store).with_namespace("ja");
    let items = common::sample_captions(2);
    let fp = fingerprint(&items);

    korean.put(&fp, &items).await;

    assert!(korean.get(&fp).await.is_some());
    assert!(japanese.get(&fp).await.is_none());
    assert_eq!(japanese.clear().await.unwrap(), 0);
    assert_eq!(korean.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_put_shouldOverwriteExistingEntry() {
    let cache = ResultCache::new(Arc::new(MemoryStore::new()));
    let items = common::sample_captions(2);
    let fp = fingerprint(&items);
    let first: Vec<_> = items.iter().map(|c| c.with_text("first")).collect();
    let second: Vec<_> = items.iter().map(|c| c.with_text("second")).collect();

    cache.put(&fp, &first).await;
    cache.put(&fp, &second).await;

    assert_eq!(cache.get(&fp).await.unwrap().items, second);
}

#[tokio::test]
async fn test_get_withUnreadableValue_shouldMiss() {
    let store = MemoryStore::new();
    let cache = ResultCache::new(Arc::new(store.clone()));
    let items = common::sample_captions(1);
    let fp = fingerprint(&items);

    store.set(&format!("lecture_{}", fp), json!("not an entry")).await.unwrap();

    assert!(cache.get(&fp).await.is_none());
}

#[tokio::test]
async fn test_brokenStore_shouldDegradeToMiss() {
    let cache = ResultCache::new(Arc::new(BrokenStore));
    let items = common::sample_captions(1);
    let fp = fingerprint(&items);

    cache.put(&fp, &items).await;

    assert!(cache.get(&fp).await.is_none());
    assert!(cache.list().await.is_err());
}

#[tokio::test]
async fn test_disabledCache_shouldNeverHit() {
    let cache = ResultCache::disabled();
    let items = common::sample_captions(1);
    let fp = fingerprint(&items);

    cache.put(&fp, &items).await;

    assert!(!cache.is_enabled());
    assert!(cache.get(&fp).await.is_none());
    assert_eq!(cache.clear().await.unwrap(), 0);
}

#[tokio::test]
async fn test_removeAndClear_shouldDeleteEntries() {
    let store = MemoryStore::new();
    let cache = ResultCache::new(Arc::new(store.clone()));
    let a = common::sample_captions(1);
    let b = common::sample_captions(2);

    cache.put(&fingerprint(&a), &a).await;
    cache.put(&fingerprint(&b), &b).await;
    cache.remove(&fingerprint(&a)).await.unwrap();

    assert!(cache.get(&fingerprint(&a)).await.is_none());
    assert_eq!(cache.clear().await.unwrap(), 1);
    assert!(store.is_empty());
}

#[test]
fn test_sentenceCache_shouldCountHitsAndMisses() {
    let cache = SentenceCache::new();

    assert!(cache.get("hello").is_none());
    cache.store("hello", "안녕하세요");
    assert_eq!(cache.get("hello").as_deref(), Some("안녕하세요"));

    let (hits, misses, rate) = cache.stats();
    assert_eq!((hits, misses), (1, 1));
    assert!((rate - 0.5).abs() < f64::EPSILON);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().0, 0);
}

#[test]
fn test_fingerprint_shouldDependOnTextOnly() {
    let items = common::sample_captions(3);
    let shifted: Vec<_> = items
        .iter()
        .map(|c| capwai::CaptionItem::new(c.start_in_seconds + 10.0, c.end_in_seconds + 10.0, c.text.clone()))
        .collect();
    let mut edited = items.clone();
    edited[1].text.push('!');

    assert_eq!(fingerprint(&items), fingerprint(&shifted));
    assert_ne!(fingerprint(&items), fingerprint(&edited));
}
