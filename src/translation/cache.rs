/*!
 * Translation caching functionality.
 *
 * Two caches live here:
 * - `ResultCache`: full translated caption lists addressed by content
 *   fingerprint, persisted through a `KeyValueStore`.
 * - `SentenceCache`: process-local map from a source sentence to its
 *   translation, used by the incremental path.
 */

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::captions::CaptionItem;
use crate::errors::CacheError;

use super::fingerprint::Fingerprint;

/// Prefix of every result cache key
const KEY_PREFIX: &str = "lecture_";

/// Persistent key-value collaborator behind the result cache
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: Value) -> Result<(), CacheError>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// All keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

/// In-memory store, used in tests and when persistence is turned off
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.values.write().remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .values
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Stored form of a cache entry
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    captions: Vec<CaptionItem>,
    timestamp: i64,
}

/// A previously computed full translation
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Content fingerprint of the source captions
    pub fingerprint: Fingerprint,

    /// Translated captions, complete and in order
    pub items: Vec<CaptionItem>,

    /// Creation time in milliseconds since the Unix epoch
    pub created_at_ms: i64,
}

impl CacheEntry {
    /// Creation time as a UTC date
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.created_at_ms)
    }
}

/// Fingerprint-addressed cache of complete translations.
///
/// Store failures never escape: reads degrade to a miss and writes are best
/// effort.
#[derive(Clone)]
pub struct ResultCache {
    store: Option<Arc<dyn KeyValueStore>>,
    namespace: Option<String>,
}

impl ResultCache {
    /// Create a cache over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: Some(store),
            namespace: None,
        }
    }

    /// Cache that never hits and never stores
    pub fn disabled() -> Self {
        Self {
            store: None,
            namespace: None,
        }
    }

    /// Separate entries per namespace, usually the target language
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = if namespace.is_empty() { None } else { Some(namespace) };
        self
    }

    /// Whether a backing store is attached
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    fn key_prefix(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}{}_", KEY_PREFIX, ns),
            None => KEY_PREFIX.to_string(),
        }
    }

    fn key_for(&self, fingerprint: &Fingerprint) -> String {
        format!("{}{}", self.key_prefix(), fingerprint)
    }

    /// Look up a complete translation
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let store = self.store.as_ref()?;
        let key = self.key_for(fingerprint);

        let value = match store.get(&key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("Cache miss for {}", key);
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                return None;
            }
        };

        match serde_json::from_value::<StoredEntry>(value) {
            Ok(stored) => {
                debug!("Cache hit for {} ({} captions)", key, stored.captions.len());
                Some(CacheEntry {
                    fingerprint: fingerprint.clone(),
                    items: stored.captions,
                    created_at_ms: stored.timestamp,
                })
            }
            Err(e) => {
                warn!("Cached value for {} is unreadable, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// Store a complete translation, replacing any previous entry
    pub async fn put(&self, fingerprint: &Fingerprint, items: &[CaptionItem]) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let key = self.key_for(fingerprint);

        let stored = StoredEntry {
            captions: items.to_vec(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let value = match serde_json::to_value(&stored) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                return;
            }
        };

        match store.set(&key, value).await {
            Ok(()) => debug!("Saved to cache: {}", key),
            Err(e) => warn!("Cache write failed for {}: {}", key, e),
        }
    }

    /// Keys owned by this cache; bare-prefix caches skip namespaced keys
    async fn own_keys(&self, store: &Arc<dyn KeyValueStore>) -> Result<Vec<String>, CacheError> {
        let prefix = self.key_prefix();
        let keys = store.keys(&prefix).await?;
        Ok(keys
            .into_iter()
            .filter(|k| self.namespace.is_some() || !k[prefix.len()..].contains('_'))
            .collect())
    }

    /// List all entries in this cache's namespace
    pub async fn list(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(Vec::new());
        };
        let prefix_len = self.key_prefix().len();

        let mut entries = Vec::new();
        for key in self.own_keys(store).await? {
            let fingerprint = Fingerprint::from_string(&key[prefix_len..]);
            if let Some(entry) = self.get(&fingerprint).await {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Remove one entry
    pub async fn remove(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        match &self.store {
            Some(store) => store.remove(&self.key_for(fingerprint)).await,
            None => Ok(()),
        }
    }

    /// Remove every entry in this cache's namespace, returning how many were removed
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(0);
        };
        let keys = self.own_keys(store).await?;
        for key in &keys {
            store.remove(key).await?;
        }
        debug!("Result cache cleared ({} entries)", keys.len());
        Ok(keys.len())
    }
}

/// Process-local cache from source sentence to translation
#[derive(Debug, Clone, Default)]
pub struct SentenceCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<String, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl SentenceCache {
    /// Create an empty sentence cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a translation from the cache
    pub fn get(&self, sentence: &str) -> Option<String> {
        let cache = self.cache.read();

        match cache.get(sentence) {
            Some(translation) => {
                *self.hits.write() += 1;
                debug!("Sentence cache hit for '{}'", truncate_text(sentence, 30));
                Some(translation.clone())
            }
            None => {
                *self.misses.write() += 1;
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn store(&self, sentence: &str, translation: &str) {
        self.cache.write().insert(sentence.to_string(), translation.to_string());
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        (hits, misses, hit_rate)
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Sentence cache cleared");
    }

    /// Number of cached sentences
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
