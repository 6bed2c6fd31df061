/*!
 * Error types for the capwai application.
 *
 * This module contains custom error types for the different parts of the
 * translation pipeline, using the thiserror crate for ergonomic error definitions.
 *
 * Only `ConfigError` ends a batch run. Backend, parse and cache failures are
 * recovered where they happen and degrade to untranslated text.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling a translation backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when decoding an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The backend answered but carried no usable text
    #[error("Backend returned an empty response")]
    EmptyResponse,

    /// The call did not finish within the configured timeout
    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::EmptyResponse
            | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors in configuration or missing preconditions
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No credentials are available for the selected backend
    #[error("No API key configured for provider {provider}")]
    MissingCredentials {
        /// Provider identifier
        provider: String,
    },

    /// A configuration value is out of range or malformed
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A language code could not be recognised
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),
}

/// Errors raised while reading model output or imported files
#[derive(Error, Debug)]
pub enum ParseError {
    /// The text could not be decoded as JSON
    #[error("Malformed JSON: {0}")]
    Malformed(String),

    /// The response decoded but no position carried a translation
    #[error("Response contained no usable entries for {expected} items")]
    NoUsableEntries {
        /// Number of items the chunk contained
        expected: usize,
    },

    /// An imported file had the wrong shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Errors raised by the persistent key-value store
#[derive(Error, Debug)]
pub enum CacheError {
    /// The storage engine failed
    #[error("Cache storage error: {0}")]
    Storage(String),

    /// A value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the backend API
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Model output could not be used
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The backend produced only whitespace
    #[error("Translation came back empty")]
    EmptyTranslation,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from a backend
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Error from the cache store
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
