/// Google Gemini backend.
///
/// Calls the `generateContent` REST endpoint with a single-turn text prompt.
use std::time::Duration;

use super::client::{LlmClient, LlmError, RETRY_DELAYS, retry_with_backoff};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Builder for `GeminiClient`.
#[derive(Debug)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API root, mainly for pointing at a proxy.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// `LlmError::MissingApiKey` when no key was supplied, `LlmError::InvalidUrl`
    /// for an unparseable base URL.
    pub fn build(self) -> Result<GeminiClient, LlmError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey { provider: "gemini" })?;

        reqwest::Url::parse(&self.base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(LlmError::Network)?;

        Ok(GeminiClient {
            client,
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Synchronous client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn generate_once(&self, url: &str, body: &serde_json::Value) -> Result<String, LlmError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
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
        parse_generate_response(&json)
    }
}

impl LlmClient for GeminiClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = self.endpoint(model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        retry_with_backoff(&RETRY_DELAYS, || self.generate_once(&url, &body))
    }
}

/// Pulls the text of the first candidate out of a `generateContent` response.
fn parse_generate_response(json: &serde_json::Value) -> Result<String, LlmError> {
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(LlmError::Api {
            message: message.to_string(),
        });
    }

    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| LlmError::Api {
            message: "Response contained no candidates".to_string(),
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(LlmError::Api {
            message: "Candidate contained no text".to_string(),
        });
    }

    Ok(text)
}
