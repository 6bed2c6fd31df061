/*!
 * Integration tests for the SQLite-backed result cache
 */

use anyhow::Result;
use std::sync::Arc;

use capwai::app_controller::{Controller, EventOutput};
use capwai::database::{DatabaseConnection, SqliteStore};
use capwai::providers::mock::MockBackend;
use capwai::translation::{fingerprint, ResultCache};
use crate::common;

fn sqlite_cache(path: &std::path::Path) -> Result<ResultCache> {
    let db = DatabaseConnection::new(path)?;
    Ok(ResultCache::new(Arc::new(SqliteStore::new(db))))
}

#[tokio::test]
async fn test_sqliteCache_shouldSurviveReopen() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("cache.db");
    let items = common::sample_captions(5);
    let translated: Vec<_> = items.iter().map(|c| c.with_text(format!("번역 {}", c.text))).collect();
    let fp = fingerprint(&items);

    sqlite_cache(&db_path)?.with_namespace("ko").put(&fp, &translated).await;

    let reopened = sqlite_cache(&db_path)?.with_namespace("ko");
    let entry = reopened.get(&fp).await.expect("entry should persist");
    assert_eq!(entry.items, translated);
    assert_eq!(reopened.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_controller_withSqliteCache_shouldSkipBackendAcrossInstances() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_caption_file(temp_dir.path(), "lecture.json", &common::sample_captions(4))?;
    let db_path = temp_dir.path().join("cache.db");

    let first_backend = MockBackend::working();
    let first = Controller::with_components(
        common::test_config(),
        Arc::new(first_backend.clone()),
        sqlite_cache(&db_path)?,
    )?
    .with_event_output(EventOutput::Log);
    first.translate_file(&input, None, false, None).await?;
    assert_eq!(first_backend.call_count(), 1);

    let second_backend = MockBackend::working();
    let second = Controller::with_components(
        common::test_config(),
        Arc::new(second_backend.clone()),
        sqlite_cache(&db_path)?,
    )?
    .with_event_output(EventOutput::Log);
    second.translate_file(&input, None, true, None).await?;
    assert_eq!(second_backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_withConfig_withCachePath_shouldOpenDatabase() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config();
    config.cache.database_path = Some(temp_dir.path().join("capwai.db"));

    let controller = Controller::with_config(config)?;

    assert!(controller.is_initialized());
    assert!(temp_dir.path().join("capwai.db").exists());
    assert_eq!(controller.cache_stats().await?.entries, 0);
    Ok(())
}
