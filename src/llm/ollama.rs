/// Ollama HTTP backend.
///
/// Synchronous client for a local or remote Ollama server's `/api/generate`
/// endpoint, with timeouts and retry on transient failures.
use std::time::Duration;

use super::client::{LlmClient, LlmError, RETRY_DELAYS, retry_with_backoff};

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use samarth::llm::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "http://localhost:11434");
/// ```
#[derive(Debug)]
pub struct OllamaClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for OllamaClientBuilder {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API (e.g. "http://localhost:11434").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the `OllamaClient`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidUrl` if the base URL does not parse, or
    /// `LlmError::Network` if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<OllamaClient, LlmError> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(LlmError::Network)?;

        Ok(OllamaClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Synchronous HTTP client for the Ollama API.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_once(&self, url: &str, body: &serde_json::Value) -> Result<String, LlmError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
            });
        }

        let json: serde_json::Value = response.json().map_err(LlmError::from_transport)?;

        json.get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::Api {
                message: "Missing 'response' field in API response".to_string(),
            })
    }
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false
        });

        retry_with_backoff(&RETRY_DELAYS, || self.generate_once(&url, &body))
    }
}
