use async_trait::async_trait;
use log::error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{http_client, status_error, transport_error, TranslationBackend};
use crate::errors::BackendError;

/// Gemini client for the Generative Language API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: reqwest::Client,
    /// API key, sent as the `key` query parameter
    api_key: String,
    /// Base URL of the API
    endpoint: String,
    /// Model name, e.g. `gemini-2.0-flash-lite`
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation turns
    contents: Vec<GeminiContent>,
    /// Sampling settings
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// One turn of content
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Parts of the turn
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// One text part
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Part text
    #[serde(default)]
    pub text: String,
}

/// Sampling settings
#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    /// Temperature for generation
    temperature: f32,
}

/// generateContent response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Candidate completions
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// One candidate completion
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// Candidate content
    pub content: Option<GeminiContent>,
}

/// Error envelope returned on failure
#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
}

impl GeminiRequest {
    /// Single-turn request carrying one prompt
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.into() }],
            }],
            generation_config: Some(GenerationConfig { temperature }),
        }
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: http_client(timeout),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            temperature,
        }
    }

    /// URL of the generateContent method for the configured model
    pub fn request_url(&self) -> Result<Url, BackendError> {
        let base = if self.endpoint.is_empty() {
            "https://generativelanguage.googleapis.com"
        } else {
            self.endpoint.trim_end_matches('/')
        };

        let mut url = Url::parse(&format!("{}/v1beta/models/{}:generateContent", base, self.model))
            .map_err(|e| BackendError::RequestFailed(format!("Invalid Gemini endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Send a generateContent request
    pub async fn complete(&self, request: &GeminiRequest) -> Result<GeminiResponse, BackendError> {
        let response = self
            .client
            .post(self.request_url()?)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("Gemini API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            let message = serde_json::from_str::<GeminiErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            error!("Gemini API error ({}): {}", status, message);
            return Err(status_error(status, message));
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| BackendError::ParseError(format!("Failed to parse Gemini API response: {}", e.without_url())))
    }

    /// Text of the first part of the first candidate
    pub fn extract_text(response: &GeminiResponse) -> Option<&str> {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.as_str())
    }
}

#[async_trait]
impl TranslationBackend for Gemini {
    async fn call(&self, prompt: &str) -> Result<String, BackendError> {
        let response = self.complete(&GeminiRequest::new(prompt, self.temperature)).await?;
        match Self::extract_text(&response) {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(BackendError::EmptyResponse),
        }
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
