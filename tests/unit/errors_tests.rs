/*!
 * Tests for error types and their conversions
 */

use std::time::Duration;

use capwai::errors::{AppError, BackendError, CacheError, ConfigError, ParseError, TranslationError};

#[test]
fn test_isRetryable_shouldSeparateTransientFromPermanent() {
    assert!(BackendError::ConnectionError("reset".to_string()).is_retryable());
    assert!(BackendError::RateLimitExceeded("slow down".to_string()).is_retryable());
    assert!(BackendError::Timeout(Duration::from_secs(60)).is_retryable());
    assert!(!BackendError::AuthenticationError("bad key".to_string()).is_retryable());
}

#[test]
fn test_translationError_fromBackend_shouldWrap() {
    let error: TranslationError = BackendError::EmptyResponse.into();
    assert!(matches!(error, TranslationError::Backend(BackendError::EmptyResponse)));
}

#[test]
fn test_configError_display_shouldNameProvider() {
    let error = ConfigError::MissingCredentials {
        provider: "gemini".to_string(),
    };
    assert!(error.to_string().contains("gemini"));
}

#[test]
fn test_parseError_display_shouldIncludeExpectedCount() {
    let error = ParseError::NoUsableEntries { expected: 50 };
    assert!(error.to_string().contains("50"));
}

#[test]
fn test_appError_fromLayers_shouldConvert() {
    let from_cache: AppError = CacheError::Storage("disk full".to_string()).into();
    let from_translation: AppError = TranslationError::EmptyTranslation.into();

    assert!(matches!(from_cache, AppError::Cache(_)));
    assert!(matches!(from_translation, AppError::Translation(_)));
}
