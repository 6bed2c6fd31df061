use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::captions::{import_translation, CaptionItem};
use crate::database::{DatabaseConnection, SqliteStore};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{create_backend, TranslationBackend};
use crate::translation::events::{EventSink, JsonLinesSink, LogSink, TranslationEvent};
use crate::translation::{BatchOrchestrator, IncrementalTranslator, PromptBuilder, ResultCache, SentenceCache};

// @module: Application controller for caption translation

/// How pipeline events are shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOutput {
    /// Progress bar on the terminal
    #[default]
    Progress,
    /// One JSON object per event on stdout
    Json,
    /// Log lines only
    Log,
}

/// Drives an indicatif progress bar from pipeline events
struct ProgressSink {
    bar: ProgressBar,
}

impl ProgressSink {
    fn new(bar: ProgressBar) -> Self {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        Self { bar }
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: TranslationEvent) {
        match event {
            TranslationEvent::Progress(percent) => self.bar.set_position(u64::from(percent)),
            TranslationEvent::Status(status) => self.bar.set_message(status),
            TranslationEvent::Complete(_) => self.bar.set_position(100),
            TranslationEvent::Error(message) => self.bar.abandon_with_message(message),
            TranslationEvent::Subtitle(text) => self.bar.println(text),
        }
    }
}

/// Summary of the result cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSummary {
    /// Cached translations
    pub entries: usize,
    /// Captions across all entries
    pub captions: usize,
    /// Most recent entry
    pub newest: Option<DateTime<Utc>>,
}

impl std::fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cached translations: {}, captions: {}", self.entries, self.captions)?;
        if let Some(newest) = self.newest {
            write!(f, ", newest: {}", newest.format("%Y-%m-%d %H:%M:%S"))?;
        }
        Ok(())
    }
}

/// Main application controller for caption translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Active backend, wrapped with timeout and retries
    backend: Arc<dyn TranslationBackend>,
    // @field: Result cache, namespaced by target language
    cache: ResultCache,
    // @field: Live sentence translations, kept across calls
    sentences: SentenceCache,
    // @field: Event presentation
    output: EventOutput,
}

impl Controller {
    // @method: Create a controller from configuration, opening the cache database
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let backend = create_backend(&config.translation);
        let cache = if config.cache.enabled {
            let db = match &config.cache.database_path {
                Some(path) => DatabaseConnection::new(path)?,
                None => DatabaseConnection::new_default()?,
            };
            ResultCache::new(Arc::new(SqliteStore::new(db)))
        } else {
            info!("Result cache disabled");
            ResultCache::disabled()
        };

        Self::with_components(config, backend, cache)
    }

    /// Create a controller around an existing backend and cache
    pub fn with_components(config: Config, backend: Arc<dyn TranslationBackend>, cache: ResultCache) -> Result<Self> {
        let namespace = language_utils::normalize_to_part1_or_part2t(&config.target_language)?;
        Ok(Self {
            config,
            backend,
            cache: cache.with_namespace(namespace),
            sentences: SentenceCache::new(),
            output: EventOutput::default(),
        })
    }

    /// Choose how events are presented
    pub fn with_event_output(mut self, output: EventOutput) -> Self {
        self.output = output;
        self
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    fn target_code(&self) -> Result<String> {
        Ok(language_utils::normalize_to_part1_or_part2t(&self.config.target_language)?)
    }

    fn prompt_builder(&self) -> Result<PromptBuilder> {
        Ok(PromptBuilder::new(
            language_utils::get_language_name(&self.config.source_language)?,
            language_utils::get_language_name(&self.config.target_language)?,
        ))
    }

    fn make_sink(&self, multi_progress: Option<&MultiProgress>) -> Arc<dyn EventSink> {
        match self.output {
            EventOutput::Json => Arc::new(JsonLinesSink),
            EventOutput::Log => Arc::new(LogSink),
            EventOutput::Progress => {
                let bar = ProgressBar::new(100);
                let bar = match multi_progress {
                    Some(multi) => multi.add(bar),
                    None => bar,
                };
                Arc::new(ProgressSink::new(bar))
            }
        }
    }

    fn orchestrator(&self, sink: Arc<dyn EventSink>) -> Result<BatchOrchestrator> {
        let orchestrator = BatchOrchestrator::new(self.backend.clone(), self.cache.clone(), self.prompt_builder()?)
            .with_sink(sink);

        Ok(match &self.config.export.directory {
            Some(directory) => orchestrator.with_export_dir(directory, self.target_code()?),
            None => orchestrator,
        })
    }

    /// Translate a caption file or every caption file under a directory
    pub async fn run(&self, input: PathBuf, output_dir: Option<PathBuf>, force_overwrite: bool) -> Result<()> {
        if input.is_dir() {
            self.run_folder(input, force_overwrite).await
        } else {
            self.translate_file(&input, output_dir.as_deref(), force_overwrite, None)
                .await
                .map(|_| ())
        }
    }

    /// Translate one caption file; returns the output path, or `None` when skipped
    pub async fn translate_file(
        &self,
        input_file: &Path,
        output_dir: Option<&Path>,
        force_overwrite: bool,
        multi_progress: Option<&MultiProgress>,
    ) -> Result<Option<PathBuf>> {
        let start_time = Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input_file.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let output_path = FileManager::generate_output_path(input_file, &output_dir, &self.target_code()?);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(None);
        }

        let items = FileManager::read_captions(input_file)?;
        info!(
            "{} - {}: {} captions from {:?}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model(),
            items.len(),
            input_file
        );

        let orchestrator = self.orchestrator(self.make_sink(multi_progress))?;
        let mode = self.config.translation.common.mode_config();
        let translated = orchestrator
            .translate_batch(&items, &mode)
            .await
            .with_context(|| format!("Failed to translate {:?}", input_file))?;

        FileManager::write_captions(&output_path, &translated)?;
        info!(
            "Wrote {:?} in {}",
            output_path,
            Self::format_duration(start_time.elapsed())
        );
        Ok(Some(output_path))
    }

    /// Translate every caption file under a directory, skipping finished ones
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let start_time = Instant::now();

        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_caption_files(&input_dir, &self.target_code()?)?;
        if files.is_empty() {
            return Err(anyhow!("No caption files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut success_count = 0;
        let mut skip_count = 0;
        let mut error_count = 0;

        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            match self.translate_file(file, None, force_overwrite, Some(&multi_progress)).await {
                Ok(Some(_)) => success_count += 1,
                Ok(None) => skip_count += 1,
                Err(e) => {
                    error!("{:#}", e);
                    error_count += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_and_clear();
        info!(
            "Processed {} files in {}: {} translated, {} skipped, {} failed",
            files.len(),
            Self::format_duration(start_time.elapsed()),
            success_count,
            skip_count,
            error_count
        );

        if error_count > 0 && success_count == 0 && skip_count == 0 {
            return Err(anyhow!("All {} files failed", error_count));
        }
        Ok(())
    }

    /// Translate one live sentence; `None` when sentence translation is disabled
    pub async fn translate_sentence(&self, current: &str, prev: &str, next: &str) -> Result<Option<String>> {
        if !self.config.translation.common.sentence_translation_enabled {
            debug!("Sentence translation disabled");
            return Ok(None);
        }

        let translator = IncrementalTranslator::new(self.backend.clone(), self.prompt_builder()?)
            .with_cache(self.sentences.clone())
            .with_sink(self.make_sink(None));
        let translation = translator.translate_one(current, prev, next).await?;
        Ok(Some(translation))
    }

    /// Check that the configured backend answers
    pub async fn test_connection(&self) -> Result<()> {
        if !self.backend.is_configured() {
            return Err(anyhow!("No API Key to test"));
        }

        let start_time = Instant::now();
        self.backend
            .test_connection()
            .await
            .with_context(|| format!("Connection to {} failed", self.backend.name()))?;

        info!(
            "Connected to {} ({}) in {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(())
    }

    /// Write a plain-text transcript of a caption file
    pub fn write_transcript(&self, input_file: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
        let items = FileManager::read_captions(input_file)?;
        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input_file.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        // The file name carries the language the captions are written in
        let target = self.target_code()?;
        let language = if input_is_translated(input_file, &target) {
            target
        } else {
            language_utils::normalize_to_part1_or_part2t(&self.config.source_language)?
        };

        let path = FileManager::write_transcript(&output_dir, &language, &items)?;
        info!("Wrote transcript {:?}", path);
        Ok(path)
    }

    /// Normalize a translation produced elsewhere.
    ///
    /// With `source_file`, the result is also stored in the cache under the
    /// source captions' fingerprint. With `output_file`, it is written out.
    pub async fn import(
        &self,
        translated_file: &Path,
        source_file: Option<&Path>,
        output_file: Option<&Path>,
    ) -> Result<Vec<CaptionItem>> {
        let content = FileManager::read_to_string(translated_file)?;
        let mut items = import_translation(&content)
            .with_context(|| format!("Invalid translation file: {:?}", translated_file))?;
        info!("Imported {} captions from {:?}", items.len(), translated_file);

        if let Some(source_file) = source_file {
            let source = FileManager::read_captions(source_file)?;
            let orchestrator = self.orchestrator(Arc::new(LogSink))?;
            items = orchestrator.store_imported(&source, items).await?;
        }

        if let Some(output_file) = output_file {
            FileManager::write_captions(output_file, &items)?;
        }

        Ok(items)
    }

    /// Summarize the result cache
    pub async fn cache_stats(&self) -> Result<CacheSummary> {
        let entries = self.cache.list().await?;
        Ok(CacheSummary {
            entries: entries.len(),
            captions: entries.iter().map(|e| e.items.len()).sum(),
            newest: entries.iter().filter_map(|e| e.created_at()).max(),
        })
    }

    /// Remove every cached translation for the target language
    pub async fn clear_cache(&self) -> Result<usize> {
        let removed = self.cache.clear().await?;
        info!("Removed {} cached translations", removed);
        Ok(removed)
    }

    /// Format a duration for display
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Whether a file name looks like one of our translated outputs
fn input_is_translated(input_file: &Path, target_code: &str) -> bool {
    input_file
        .file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with(&format!(".{}", target_code)))
}
