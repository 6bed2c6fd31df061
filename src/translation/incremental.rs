/*!
 * Sentence-at-a-time translation for live captions.
 *
 * Each sentence is translated with its neighbours as context. Results are
 * remembered per source sentence, so repeated sentences never reach the
 * backend twice.
 */

use log::{debug, error};
use std::sync::Arc;

use crate::errors::{ConfigError, TranslationError};
use crate::providers::TranslationBackend;

use super::cache::SentenceCache;
use super::events::{EventSink, NoopSink, TranslationEvent};
use super::prompts::PromptBuilder;

/// Translates single sentences with surrounding context
pub struct IncrementalTranslator {
    backend: Arc<dyn TranslationBackend>,
    prompts: PromptBuilder,
    cache: SentenceCache,
    sink: Arc<dyn EventSink>,
}

impl IncrementalTranslator {
    /// Create a translator with an empty sentence cache
    pub fn new(backend: Arc<dyn TranslationBackend>, prompts: PromptBuilder) -> Self {
        Self {
            backend,
            prompts,
            cache: SentenceCache::new(),
            sink: Arc::new(NoopSink),
        }
    }

    /// Share `cache` with other translators instead of starting empty
    pub fn with_cache(mut self, cache: SentenceCache) -> Self {
        self.cache = cache;
        self
    }

    /// Report subtitles and errors to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The sentence cache owned by this translator
    pub fn cache(&self) -> &SentenceCache {
        &self.cache
    }

    /// Forget every cached sentence and reset the hit counters
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Translate `current`, using `prev` and `next` as context
    pub async fn translate_one(&self, current: &str, prev: &str, next: &str) -> Result<String, TranslationError> {
        if current.trim().is_empty() {
            return Ok(String::new());
        }

        if let Some(hit) = self.cache.get(current) {
            debug!("Sentence cache hit");
            return Ok(hit);
        }

        let result = self.request(current, prev, next).await;
        match &result {
            Ok(translation) => {
                self.cache.store(current, translation);
                self.sink.emit(TranslationEvent::Subtitle(translation.clone()));
            }
            Err(e) => {
                error!("Sentence translation failed: {}", e);
                self.sink.emit(TranslationEvent::Error(e.to_string()));
            }
        }
        result
    }

    async fn request(&self, current: &str, prev: &str, next: &str) -> Result<String, TranslationError> {
        if !self.backend.is_configured() {
            return Err(ConfigError::MissingCredentials {
                provider: self.backend.name().to_string(),
            }
            .into());
        }

        let prompt = self.prompts.sentence_prompt(current, prev, next);
        let raw = self.backend.call(&prompt).await?;

        let translation = raw.trim();
        if translation.is_empty() {
            return Err(TranslationError::EmptyTranslation);
        }
        Ok(translation.to_string())
    }
}
