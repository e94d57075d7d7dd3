/// Language model clients.
///
/// Both backends implement [`LlmClient`]; [`client_from_config`] picks one
/// according to the configured provider.
mod client;
mod gemini;
mod ollama;

use std::sync::Arc;

pub use client::{LlmClient, LlmError, RETRY_DELAYS, extract_json, retry_with_backoff};
pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use ollama::{OllamaClient, OllamaClientBuilder};

use crate::config::{Config, LlmProvider};

/// Builds the language model client selected by `config`.
///
/// # Errors
///
/// Propagates builder failures such as a missing Gemini key or a malformed
/// Ollama host URL.
pub fn client_from_config(config: &Config) -> Result<Arc<dyn LlmClient>, LlmError> {
    let client: Arc<dyn LlmClient> = match config.llm_provider {
        LlmProvider::Gemini => {
            let mut builder = GeminiClientBuilder::new();
            if let Some(key) = &config.gemini_api_key {
                builder = builder.api_key(key.clone());
            }
            Arc::new(builder.build()?)
        }
        LlmProvider::Ollama => Arc::new(
            OllamaClientBuilder::new()
                .base_url(config.ollama_host.clone())
                .build()?,
        ),
    };
    Ok(client)
}
