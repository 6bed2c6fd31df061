/*!
 * Common test utilities for the capwai test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use capwai::app_config::Config;
use capwai::app_controller::{Controller, EventOutput};
use capwai::captions::{captions_to_json, CaptionItem};
use capwai::providers::mock::MockBackend;
use capwai::translation::{MemoryStore, ResultCache};

/// Route library logs to the test output; safe to call many times
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// `count` captions, two seconds each, with distinct texts
pub fn sample_captions(count: usize) -> Vec<CaptionItem> {
    (0..count)
        .map(|i| {
            let start = i as f64 * 2.0;
            CaptionItem::new(start, start + 2.0, format!("caption number {}", i))
        })
        .collect()
}

/// Creates a caption JSON file in the specified directory
pub fn create_caption_file(dir: &Path, filename: &str, items: &[CaptionItem]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, captions_to_json(items)?)?;
    Ok(file_path)
}

/// Default configuration with the cache and sentence translation enabled
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "ko".to_string();
    config.translation.set_api_key("test-key");
    config
}

/// Controller over a mock backend and an in-memory cache.
///
/// Returns the store so tests can inspect what was cached.
pub fn mock_controller(config: Config, backend: MockBackend) -> Result<(Controller, MemoryStore)> {
    let store = MemoryStore::new();
    let cache = ResultCache::new(Arc::new(store.clone()));
    let controller = Controller::with_components(config, Arc::new(backend), cache)?.with_event_output(EventOutput::Log);
    Ok((controller, store))
}
