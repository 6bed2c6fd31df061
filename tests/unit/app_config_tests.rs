/*!
 * Tests for application configuration
 */

use anyhow::Result;
use log::LevelFilter;
use std::str::FromStr;

use capwai::app_config::{Config, LogLevel, TranslationProvider};
use capwai::errors::ConfigError;
use capwai::translation::SpeedMode;
use crate::common;

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.target_language, "ko");
    let reloaded = Config::from_file(&path)?;
    assert_eq!(reloaded.translation.provider, config.translation.provider);
    Ok(())
}

#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "source_language": "en",
            "target_language": "ja",
            "translation": {
                "provider": "ollama",
                "available_providers": [{"type": "ollama", "model": "qwen2.5:7b"}],
                "common": {"speed_mode": "fast"}
            }
        }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.get_model(), "qwen2.5:7b");
    assert_eq!(config.translation.common.speed_mode, SpeedMode::Fast);
    assert_eq!(config.translation.common.chunk_size, 50);
    assert!(config.cache.enabled);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_validate_withUnknownLanguage_shouldFail() {
    let mut config = common::test_config();
    config.target_language = "klingon".to_string();

    assert!(matches!(config.validate(), Err(ConfigError::InvalidLanguage(_))));
}

#[test]
fn test_validate_withZeroChunkSize_shouldFail() {
    let mut config = common::test_config();
    config.translation.common.chunk_size = 0;

    assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
}

#[test]
fn test_validate_withoutApiKey_shouldPass() {
    let config = Config::default();
    assert!(config.translation.get_api_key().is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_modeConfig_shouldFollowSpeedModeAndChunkSize() {
    let mut config = common::test_config();
    config.translation.common.speed_mode = SpeedMode::Fast;
    config.translation.common.chunk_size = 20;

    let mode = config.translation.common.mode_config();

    assert_eq!(mode.chunk_size, 20);
    assert_eq!(mode.concurrency, 5);
    assert_eq!(mode.inter_batch_delay_ms, 200);
}

#[test]
fn test_providerFromStr_shouldIgnoreCase() {
    assert_eq!(TranslationProvider::from_str("Gemini").unwrap(), TranslationProvider::Gemini);
    assert_eq!(TranslationProvider::from_str("OLLAMA").unwrap(), TranslationProvider::Ollama);
    assert!(TranslationProvider::from_str("openai").is_err());
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(LevelFilter::from(&LogLevel::Warn), LevelFilter::Warn);
    assert_eq!(LevelFilter::from(&LogLevel::default()), LevelFilter::Info);
}
