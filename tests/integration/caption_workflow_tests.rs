/*!
 * Integration tests for the caption file workflow through the controller
 */

use anyhow::Result;
use tokio_test::{assert_err, assert_ok};

use capwai::captions::CaptionItem;
use capwai::file_utils::FileManager;
use capwai::providers::mock::MockBackend;
use capwai::translation::SpeedMode;
use crate::common;

/// Translate a file, then translate it again from the cache
#[tokio::test(start_paused = true)]
async fn test_translateFile_twice_shouldReuseCachedResult() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let items = common::sample_captions(60);
    let input = common::create_caption_file(temp_dir.path(), "lecture.json", &items)?;
    let backend = MockBackend::working();
    let (controller, store) = common::mock_controller(common::test_config(), backend.clone())?;

    let output = controller.translate_file(&input, None, false, None).await?;

    let output = output.expect("file should be translated");
    assert_eq!(output, temp_dir.path().join("lecture.ko.json"));
    let translated = FileManager::read_captions(&output)?;
    assert_eq!(translated.len(), 60);
    assert!(translated.iter().all(|c| c.text.starts_with("[translated] ")));
    assert_eq!(backend.call_count(), 2);
    assert_eq!(store.len(), 1);

    // Without force the existing output is kept
    assert_eq!(controller.translate_file(&input, None, false, None).await?, None);

    // With force the file is rewritten from the cache
    assert_ok!(controller.translate_file(&input, None, true, None).await);
    assert_eq!(backend.call_count(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_runFolder_shouldTranslateEveryCaptionFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("week2");
    std::fs::create_dir(&nested)?;
    common::create_caption_file(temp_dir.path(), "a.json", &common::sample_captions(3))?;
    common::create_caption_file(&nested, "b.json", &common::sample_captions(5))?;
    let mut config = common::test_config();
    config.translation.common.speed_mode = SpeedMode::Fast;
    let (controller, _store) = common::mock_controller(config, MockBackend::working())?;

    controller.run(temp_dir.path().to_path_buf(), None, false).await?;

    assert!(temp_dir.path().join("a.ko.json").exists());
    assert!(nested.join("b.ko.json").exists());

    // A second pass finds only finished files and skips them
    assert_ok!(controller.run(temp_dir.path().to_path_buf(), None, false).await);
    Ok(())
}

#[tokio::test]
async fn test_translateFile_withoutApiKey_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_caption_file(temp_dir.path(), "lecture.json", &common::sample_captions(2))?;
    let (controller, _store) = common::mock_controller(common::test_config(), MockBackend::unconfigured())?;

    let result = controller.translate_file(&input, None, false, None).await;

    let error = assert_err!(result);
    assert!(format!("{:#}", error).contains("No API key"));
    assert!(!temp_dir.path().join("lecture.ko.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_translateSentence_shouldRespectConfigSwitch() -> Result<()> {
    let (controller, _store) = common::mock_controller(common::test_config(), MockBackend::working())?;
    let translation = controller.translate_sentence("hello there", "", "").await?;
    assert_eq!(translation.as_deref(), Some("[translated] hello there"));

    let mut disabled = common::test_config();
    disabled.translation.common.sentence_translation_enabled = false;
    let (controller, _store) = common::mock_controller(disabled, MockBackend::working())?;
    assert_eq!(controller.translate_sentence("hello there", "", "").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_translateSentence_twice_shouldCallBackendOnce() -> Result<()> {
    let backend = MockBackend::working();
    let (controller, _store) = common::mock_controller(common::test_config(), backend.clone())?;

    let first = controller.translate_sentence("the bias term", "", "").await?;
    let second = controller.translate_sentence("the bias term", "", "").await?;

    assert_eq!(first, second);
    assert_eq!(backend.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_testConnection_shouldReportBackendState() {
    let (working, _) = common::mock_controller(common::test_config(), MockBackend::working()).unwrap();
    let (rejecting, _) = common::mock_controller(common::test_config(), MockBackend::rejecting()).unwrap();
    let (unconfigured, _) = common::mock_controller(common::test_config(), MockBackend::unconfigured()).unwrap();

    assert_ok!(working.test_connection().await);
    assert_err!(rejecting.test_connection().await);
    let error = assert_err!(unconfigured.test_connection().await);
    assert_eq!(error.to_string(), "No API Key to test");
}

#[test]
fn test_writeTranscript_shouldNameFileByCaptionLanguage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_caption_file(temp_dir.path(), "lecture.json", &common::sample_captions(2))?;
    let translated = common::create_caption_file(
        temp_dir.path(),
        "lecture.ko.json",
        &[CaptionItem::new(0.0, 2.0, "안녕하세요")],
    )?;
    let (controller, _store) = common::mock_controller(common::test_config(), MockBackend::working())?;

    let source_transcript = controller.write_transcript(&source, None)?;
    let translated_transcript = controller.write_transcript(&translated, None)?;

    assert!(source_transcript.file_name().unwrap().to_string_lossy().starts_with("transcript_en_"));
    assert!(translated_transcript.file_name().unwrap().to_string_lossy().starts_with("transcript_ko_"));
    assert_eq!(FileManager::read_to_string(&translated_transcript)?, "[00:00:00] 안녕하세요");
    Ok(())
}

#[tokio::test]
async fn test_import_withSource_shouldSeedCache() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let items = vec![CaptionItem::new(2.0, 4.0, "first"), CaptionItem::new(4.0, 6.0, "second")];
    let source = common::create_caption_file(temp_dir.path(), "lecture.json", &items)?;
    let translated = temp_dir.path().join("external.json");
    std::fs::write(&translated, r#"[{"id":"00:00:02","text":"첫째"},{"id":"00:00:04","text":"둘째"}]"#)?;
    let backend = MockBackend::working();
    let (controller, store) = common::mock_controller(common::test_config(), backend.clone())?;

    let imported = controller.import(&translated, Some(&source), None).await?;

    assert_eq!(imported[0], CaptionItem::new(2.0, 4.0, "첫째"));
    assert_eq!(imported[1], CaptionItem::new(4.0, 9.0, "둘째"));
    assert_eq!(store.len(), 1);

    // The source now translates from the cache
    controller.translate_file(&source, None, false, None).await?;
    assert_eq!(backend.call_count(), 0);
    let output = FileManager::read_captions(temp_dir.path().join("lecture.ko.json"))?;
    assert_eq!(output, imported);
    Ok(())
}

#[tokio::test]
async fn test_import_withMismatchedLength_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_caption_file(temp_dir.path(), "lecture.json", &common::sample_captions(3))?;
    let translated = temp_dir.path().join("external.json");
    std::fs::write(&translated, r#"[{"startInSeconds":0,"text":"하나"}]"#)?;
    let (controller, store) = common::mock_controller(common::test_config(), MockBackend::working())?;

    assert_err!(controller.import(&translated, Some(&source), None).await);
    assert!(store.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cacheStatsAndClear_shouldCoverTargetNamespaceOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_caption_file(temp_dir.path(), "lecture.json", &common::sample_captions(3))?;
    let (controller, store) = common::mock_controller(common::test_config(), MockBackend::working())?;
    controller.translate_file(&input, None, false, None).await?;

    let summary = controller.cache_stats().await?;
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.captions, 3);
    assert!(summary.newest.is_some());

    assert_eq!(controller.clear_cache().await?, 1);
    assert!(store.is_empty());
    Ok(())
}
