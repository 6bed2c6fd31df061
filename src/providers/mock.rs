/*!
 * Mock backend for testing.
 *
 * This module provides a scripted backend that simulates different behaviors:
 * - `MockBackend::working()` - translates batch and sentence prompts
 * - `MockBackend::failing()` - always fails with a retryable error
 * - `MockBackend::flaky(n)` - fails the first `n` calls, then works
 * - `MockBackend::unconfigured()` - reports missing credentials
 *
 * Batch prompts are answered with a fenced JSON array built from the payload
 * embedded in the prompt, so the full parsing path is exercised.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::BackendError;
use crate::providers::TranslationBackend;
use crate::translation::parser::{slice_array_span, strip_code_fence};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Always returns the same text
    Fixed(String),
    /// Always fails with a retryable error
    Failing,
    /// Always fails with a non-retryable authentication error
    Rejecting,
    /// Fails the first N calls, then works
    Flaky { failures: usize },
    /// Fails every Nth call
    Intermittent { fail_every: usize },
    /// Fails whenever the prompt contains the marker
    FailOnMarker(String),
    /// Returns whitespace only
    Empty,
    /// Answers after a delay
    Slow { delay_ms: u64 },
    /// Works but reports missing credentials
    Unconfigured,
}

/// Mock backend for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Prefix added to each translated text
    tag: String,
    /// Number of calls made so far
    request_count: Arc<AtomicUsize>,
    /// Every prompt received, in order
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            tag: "[translated]".to_string(),
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Backend that always answers `text`
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fixed(text.into()))
    }

    /// Backend that always fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Backend that rejects the credentials
    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    /// Backend that fails the first `failures` calls
    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::Flaky { failures })
    }

    /// Backend that fails every `fail_every`-th call
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Backend that fails for prompts containing `marker`
    pub fn fail_on(marker: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailOnMarker(marker.into()))
    }

    /// Backend that answers with whitespace
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Backend that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Backend without credentials
    pub fn unconfigured() -> Self {
        Self::new(MockBehavior::Unconfigured)
    }

    /// Replace the prefix added to translated text
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Reset the call counter and prompt log
    pub fn reset(&self) {
        self.request_count.store(0, Ordering::SeqCst);
        self.prompts.lock().clear();
    }

    fn translate(&self, text: &str) -> String {
        format!("{} {}", self.tag, text)
    }

    /// Answer a prompt the way a cooperative model would
    pub fn respond(&self, prompt: &str) -> String {
        if prompt.contains("```json") {
            let payload = slice_array_span(strip_code_fence(prompt));
            let records: Vec<Value> = serde_json::from_str(payload).unwrap_or_default();
            let translated: Vec<Value> = records
                .iter()
                .map(|r| {
                    let text = r.get("text").and_then(Value::as_str).unwrap_or_default();
                    json!({"id": r.get("id").cloned().unwrap_or(Value::Null), "text": self.translate(text)})
                })
                .collect();
            let body = serde_json::to_string(&translated).unwrap_or_else(|_| "[]".to_string());
            return format!("```json\n{}\n```", body);
        }

        match extract_target_sentence(prompt) {
            Some(sentence) => self.translate(sentence),
            None => self.translate(prompt),
        }
    }
}

/// Text between the `Target Sentence:` triple quotes of a sentence prompt
fn extract_target_sentence(prompt: &str) -> Option<&str> {
    let start = prompt.find("Target Sentence:")?;
    let rest = &prompt[start..];
    let open = rest.find("\"\"\"")? + 3;
    let close = rest[open..].find("\"\"\"")? + open;
    Some(rest[open..close].trim())
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn call(&self, prompt: &str) -> Result<String, BackendError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().push(prompt.to_string());

        match &self.behavior {
            MockBehavior::Working | MockBehavior::Unconfigured => Ok(self.respond(prompt)),
            MockBehavior::Fixed(text) => Ok(text.clone()),
            MockBehavior::Failing => Err(BackendError::RequestFailed("Simulated provider failure".to_string())),
            MockBehavior::Rejecting => Err(BackendError::AuthenticationError("Invalid API key".to_string())),
            MockBehavior::Flaky { failures } => {
                if count <= *failures {
                    Err(BackendError::ConnectionError(format!("Simulated failure {}", count)))
                } else {
                    Ok(self.respond(prompt))
                }
            }
            MockBehavior::Intermittent { fail_every } => {
                if *fail_every > 0 && count % fail_every == 0 {
                    Err(BackendError::RequestFailed(format!("Simulated intermittent failure on request {}", count)))
                } else {
                    Ok(self.respond(prompt))
                }
            }
            MockBehavior::FailOnMarker(marker) => {
                if prompt.contains(marker.as_str()) {
                    Err(BackendError::ApiError {
                        status_code: 500,
                        message: format!("Simulated failure for {}", marker),
                    })
                } else {
                    Ok(self.respond(prompt))
                }
            }
            MockBehavior::Empty => Ok("   ".to_string()),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(self.respond(prompt))
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.behavior != MockBehavior::Unconfigured
    }

    fn name(&self) -> &str {
        "mock"
    }
}
