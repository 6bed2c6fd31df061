/*!
 * Batch translation of a full caption list.
 *
 * A run fingerprints the list, answers from the result cache when it can, and
 * otherwise schedules chunked backend calls, parses each response, merges the
 * chunks in order and stores the complete result. Progress and outcome are
 * reported through an `EventSink`.
 */

use anyhow::Context;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::captions::{captions_to_json, CaptionItem, Chunk, ChunkResult};
use crate::errors::{ConfigError, ParseError, TranslationError};
use crate::providers::TranslationBackend;

use super::cache::ResultCache;
use super::events::{EventSink, NoopSink, TranslationEvent};
use super::fingerprint::{fingerprint, Fingerprint};
use super::modes::ModeConfig;
use super::parser;
use super::prompts::PromptBuilder;
use super::scheduler::ChunkScheduler;

/// Status shown when a run is answered from the cache
pub const STATUS_CACHE_HIT: &str = "Loaded from Cache (Saved API Tokens!)";
/// Final status after a cache hit
pub const STATUS_READY_CACHED: &str = "READY (Cached)";
/// Final status after a fresh run was stored
pub const STATUS_READY_SAVED: &str = "READY (Saved)";
/// Final status after a run that could not be stored
pub const STATUS_READY: &str = "READY";
/// Final status after an import
pub const STATUS_READY_IMPORTED: &str = "READY (Imported)";
/// Error reported when the backend has no credentials
pub const ERROR_NO_API_KEY: &str = "No API Key";

/// File name of an exported translation
pub fn export_file_name(fingerprint: &Fingerprint, target_language: &str) -> String {
    format!("lecture_{}_{}.json", fingerprint, target_language)
}

/// Export destination for fresh results
#[derive(Debug, Clone)]
struct Exporter {
    directory: PathBuf,
    target_language: String,
}

/// Runs batch translations against one backend and one cache
pub struct BatchOrchestrator {
    backend: Arc<dyn TranslationBackend>,
    cache: ResultCache,
    prompts: PromptBuilder,
    sink: Arc<dyn EventSink>,
    exporter: Option<Exporter>,
}

impl BatchOrchestrator {
    /// Create an orchestrator that reports to nobody
    pub fn new(backend: Arc<dyn TranslationBackend>, cache: ResultCache, prompts: PromptBuilder) -> Self {
        Self {
            backend,
            cache,
            prompts,
            sink: Arc::new(NoopSink),
            exporter: None,
        }
    }

    /// Report events to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Write each fresh result into `directory`
    pub fn with_export_dir(mut self, directory: impl AsRef<Path>, target_language: impl Into<String>) -> Self {
        self.exporter = Some(Exporter {
            directory: directory.as_ref().to_path_buf(),
            target_language: target_language.into(),
        });
        self
    }

    /// Result cache used by this orchestrator
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn emit(&self, event: TranslationEvent) {
        self.sink.emit(event);
    }

    fn status(&self, text: impl Into<String>) {
        self.emit(TranslationEvent::Status(text.into()));
    }

    /// Translate one chunk: prompt, call, parse
    async fn translate_chunk(&self, chunk: Chunk) -> anyhow::Result<ChunkResult> {
        let prompt = self.prompts.batch_prompt(&chunk.items);
        let raw = self.backend.call(&prompt).await?;

        let parsed = parser::parse_detailed(&raw, &chunk.items);
        if parsed.is_total_fallback() && !chunk.items.is_empty() {
            return Err(ParseError::NoUsableEntries {
                expected: chunk.items.len(),
            }
            .into());
        }

        let degraded = parsed.matched < chunk.items.len();
        if degraded {
            debug!(
                "Chunk at {}: {} of {} captions translated",
                chunk.origin_index,
                parsed.matched,
                chunk.items.len()
            );
        }

        Ok(ChunkResult {
            origin_index: chunk.origin_index,
            items: parsed.items,
            degraded,
        })
    }

    /// Translate a full caption list.
    ///
    /// Only missing credentials end the run with an error. Chunk failures keep
    /// the original text for that chunk; such a run is returned but not cached.
    pub async fn translate_batch(
        &self,
        items: &[CaptionItem],
        mode: &ModeConfig,
    ) -> Result<Vec<CaptionItem>, TranslationError> {
        if items.is_empty() {
            debug!("Nothing to translate");
            self.emit(TranslationEvent::Complete(Vec::new()));
            return Ok(Vec::new());
        }

        if !self.backend.is_configured() {
            self.emit(TranslationEvent::Error(ERROR_NO_API_KEY.to_string()));
            return Err(ConfigError::MissingCredentials {
                provider: self.backend.name().to_string(),
            }
            .into());
        }

        let fingerprint = fingerprint(items);

        if let Some(entry) = self.cache.get(&fingerprint).await {
            info!("Cache hit for {} ({} captions)", fingerprint, entry.items.len());
            self.status(STATUS_CACHE_HIT);
            self.emit(TranslationEvent::Complete(entry.items.clone()));
            self.status(STATUS_READY_CACHED);
            return Ok(entry.items);
        }

        let start_time = Instant::now();
        info!(
            "Translating {} captions with {} in {} mode",
            items.len(),
            self.backend.name(),
            mode.mode
        );

        let scheduler = ChunkScheduler::new(*mode);
        let label = mode.mode.display_name();
        let report = scheduler
            .run(
                items,
                |chunk| self.translate_chunk(chunk),
                |percent| {
                    self.emit(TranslationEvent::Progress(percent));
                    self.status(format!("Translating... {}% ({})", percent, label));
                },
            )
            .await;

        let complete = report.is_complete();
        if complete {
            self.cache.put(&fingerprint, &report.items).await;
        } else {
            warn!(
                "{} of {} chunks failed and {} were partly translated; result not cached",
                report.failed_chunks.len(),
                report.total_chunks,
                report.degraded_chunks.len()
            );
        }

        if let Some(exporter) = &self.exporter {
            if let Err(e) = export(exporter, &fingerprint, &report.items).await {
                warn!("Export failed: {:#}", e);
            }
        }

        info!("Batch translation finished in {:?}", start_time.elapsed());
        self.emit(TranslationEvent::Complete(report.items.clone()));
        self.status(if complete { STATUS_READY_SAVED } else { STATUS_READY });

        Ok(report.into_items())
    }

    /// Store a translation produced elsewhere as the result for `source`
    pub async fn store_imported(
        &self,
        source: &[CaptionItem],
        translated: Vec<CaptionItem>,
    ) -> Result<Vec<CaptionItem>, TranslationError> {
        if source.len() != translated.len() {
            return Err(ParseError::InvalidFormat(format!(
                "imported list has {} items, source has {}",
                translated.len(),
                source.len()
            ))
            .into());
        }

        self.cache.put(&fingerprint(source), &translated).await;
        self.emit(TranslationEvent::Complete(translated.clone()));
        self.status(STATUS_READY_IMPORTED);
        Ok(translated)
    }
}

async fn export(exporter: &Exporter, fingerprint: &Fingerprint, items: &[CaptionItem]) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(&exporter.directory)
        .await
        .with_context(|| format!("Failed to create export directory {:?}", exporter.directory))?;

    let path = exporter
        .directory
        .join(export_file_name(fingerprint, &exporter.target_language));
    let json = captions_to_json(items)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;

    info!("Exported translation to {:?}", path);
    Ok(path)
}
