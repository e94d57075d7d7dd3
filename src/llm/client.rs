/// Shared language model client contract.
///
/// Error types, the `LlmClient` trait implemented by every backend, and the
/// retry helper the HTTP backends wrap their calls in.
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Default backoff schedule: three retries after 1s, 2s and 4s.
pub const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Errors that can occur when talking to a language model backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Backend-specific errors (missing fields, refusals, error payloads)
    #[error("LLM API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The backend needs a credential that was not configured
    #[error("Missing API key for {provider}")]
    MissingApiKey { provider: &'static str },
}

impl LlmError {
    /// Classifies a transport error as a timeout or a generic network failure.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Text-in, text-out language model.
///
/// Implemented by the HTTP backends and by mocks in tests.
pub trait LlmClient: Send + Sync {
    /// Generates a completion for `prompt` using `model`.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Retries an operation with backoff.
///
/// The operation runs once, then once more after each entry of `delays`.
/// Only transient errors (HTTP 5xx, network errors, timeouts) are retried;
/// anything else is returned immediately.
pub fn retry_with_backoff<F, T>(delays: &[Duration], mut f: F) -> Result<T, LlmError>
where
    F: FnMut() -> Result<T, LlmError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !should_retry(&e) => return Err(e),
        Err(e) => e,
    };

    for delay in delays {
        thread::sleep(*delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

fn should_retry(error: &LlmError) -> bool {
    match error {
        LlmError::Network(_) | LlmError::Timeout(_) => true,
        LlmError::Http { status } => (500..600).contains(status),
        LlmError::Serialization(_)
        | LlmError::Api { .. }
        | LlmError::InvalidUrl(_)
        | LlmError::MissingApiKey { .. } => false,
    }
}

/// Extracts the outermost JSON object from model output.
///
/// Models like to wrap JSON in markdown fences or prose; everything before the
/// first `{` and after the last `}` is dropped.
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;

    (start <= end).then(|| &trimmed[start..=end])
}
