/*!
 * Translation backends.
 *
 * Each backend turns a prompt into raw model text:
 * - `gemini`: Google Generative Language API (default)
 * - `anthropic`: Anthropic Messages API
 * - `ollama`: local Ollama server
 * - `mock`: scripted backend for tests and benches
 *
 * Backends built from configuration are wrapped in `ResilientBackend`, which
 * bounds every call with a timeout and retries transient failures.
 */

use async_trait::async_trait;
use log::warn;
use reqwest::StatusCode;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::BackendError;

/// Prompt sent by `test_connection`
pub const CONNECTION_TEST_PROMPT: &str = "Hello";

/// Common trait for all translation backends
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Send a prompt and return the model's raw text
    async fn call(&self, prompt: &str) -> Result<String, BackendError>;

    /// Check that the backend answers a trivial prompt
    async fn test_connection(&self) -> Result<(), BackendError> {
        self.call(CONNECTION_TEST_PROMPT).await.map(|_| ())
    }

    /// Whether credentials required by the backend are present
    fn is_configured(&self) -> bool {
        true
    }

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Map a non-success HTTP status onto the backend error taxonomy
pub(crate) fn status_error(status: StatusCode, message: String) -> BackendError {
    match status.as_u16() {
        401 | 403 => BackendError::AuthenticationError(message),
        429 => BackendError::RateLimitExceeded(message),
        code => BackendError::ApiError {
            status_code: code,
            message,
        },
    }
}

/// Map a transport failure onto the backend error taxonomy
///
/// The request URL is stripped from the message since some providers carry
/// credentials in the query string.
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> BackendError {
    let error = error.without_url();
    if error.is_connect() {
        BackendError::ConnectionError(format!("{}: {}", provider, error))
    } else {
        BackendError::RequestFailed(format!("Failed to send request to {}: {}", provider, error))
    }
}

/// Build an HTTP client with the given timeout
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with {:?} timeout, using defaults: {}", timeout, e);
            reqwest::Client::new()
        })
}

/// Adds a per-call timeout and exponential-backoff retries to another backend
#[derive(Debug, Clone)]
pub struct ResilientBackend {
    /// Wrapped backend
    inner: Arc<dyn TranslationBackend>,
    /// Upper bound on one call
    timeout: Duration,
    /// Retries after the first attempt
    max_retries: u32,
    /// Backoff before the first retry, doubled on each further retry
    backoff_base_ms: u64,
}

impl ResilientBackend {
    /// Wrap a backend
    pub fn new(inner: Arc<dyn TranslationBackend>, timeout: Duration, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            inner,
            timeout,
            max_retries,
            backoff_base_ms,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    async fn attempt(&self, prompt: &str) -> Result<String, BackendError> {
        match tokio::time::timeout(self.timeout, self.inner.call(prompt)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl TranslationBackend for ResilientBackend {
    async fn call(&self, prompt: &str) -> Result<String, BackendError> {
        let mut attempt = 0;
        loop {
            match self.attempt(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} call failed ({}), retry {}/{} in {:?}",
                        self.inner.name(),
                        e,
                        attempt,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn test_connection(&self) -> Result<(), BackendError> {
        match tokio::time::timeout(self.timeout, self.inner.test_connection()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        }
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Build the active backend described by the configuration
pub fn create_backend(config: &TranslationConfig) -> Arc<dyn TranslationBackend> {
    let model = config.get_model();
    let api_key = config.get_api_key();
    let endpoint = config.get_endpoint();
    let temperature = config.common.temperature;
    let timeout = Duration::from_secs(config.get_timeout_secs());

    let inner: Arc<dyn TranslationBackend> = match config.provider {
        TranslationProvider::Gemini => Arc::new(gemini::Gemini::new(api_key, endpoint, model, temperature, timeout)),
        TranslationProvider::Anthropic => {
            Arc::new(anthropic::Anthropic::new(api_key, endpoint, model, temperature, timeout))
        }
        TranslationProvider::Ollama => Arc::new(ollama::Ollama::new(endpoint, model, temperature, timeout)),
    };

    Arc::new(ResilientBackend::new(
        inner,
        timeout,
        config.common.retry_count,
        config.common.retry_backoff_ms,
    ))
}

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
