use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{http_client, status_error, transport_error, TranslationBackend};
use crate::errors::BackendError;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: reqwest::Client,
    /// Model name
    model: String,
    /// Temperature for generation
    temperature: f32,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

/// Version response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    /// Server version
    pub version: String,
}

impl GenerationRequest {
    /// Non-streaming request for one prompt
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: Some(GenerationOptions {
                temperature: Some(temperature),
            }),
            stream: false,
        }
    }
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, temperature: f32, timeout: Duration) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.is_empty() {
            "http://localhost:11434".to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };

        Self {
            base_url,
            client: http_client(timeout),
            model: model.into(),
            temperature,
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate a completion
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("Ollama API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| BackendError::ParseError(format!("Failed to parse Ollama API response: {}", e)))
    }

    /// Get the server version
    pub async fn version(&self) -> Result<String, BackendError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("Ollama API", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "version request failed".to_string()));
        }

        let version = response
            .json::<VersionResponse>()
            .await
            .map_err(|e| BackendError::ParseError(format!("Failed to parse version response: {}", e)))?;
        Ok(version.version)
    }
}

#[async_trait]
impl TranslationBackend for Ollama {
    async fn call(&self, prompt: &str) -> Result<String, BackendError> {
        let request = GenerationRequest::new(&self.model, prompt, self.temperature);
        let response = self.generate(&request).await?;
        if response.response.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(response.response)
    }

    async fn test_connection(&self) -> Result<(), BackendError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        self.call(super::CONNECTION_TEST_PROMPT).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
