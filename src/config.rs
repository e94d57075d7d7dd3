//! Process-wide configuration.
//!
//! `Config` is built exactly once at startup (after `.env` is loaded) and then
//! passed by reference into the components that need it. Nothing below this
//! module reads the environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::utils::default_cache_dir;

const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_CACHE_EXPIRY_DAYS: u64 = 7;
const DEFAULT_PORT: u16 = 5000;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Errors raised while reading configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which language model backend answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown provider '{other}', expected gemini or ollama")),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// Runtime configuration for the whole application.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_provider: LlmProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ollama_host: String,
    pub ollama_model: String,
    /// Credential sent to data.gov.in; may be empty, in which case remote
    /// fetches fail and the fixtures take over.
    pub data_gov_api_key: String,
    pub cache_dir: PathBuf,
    /// `None` disables cache expiry.
    pub cache_expiry: Option<Duration>,
    pub port: u16,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::Ollama,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_model: String::new(),
            data_gov_api_key: String::new(),
            cache_dir: default_cache_dir(),
            cache_expiry: Some(Duration::from_secs(DEFAULT_CACHE_EXPIRY_DAYS * SECONDS_PER_DAY)),
            port: DEFAULT_PORT,
            debug: false,
        }
    }
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or enumerated variable
    /// is set to something unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let gemini_api_key = get("GEMINI_API_KEY");

        let llm_provider = match get("LLM_PROVIDER") {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                name: "LLM_PROVIDER",
                value,
                reason,
            })?,
            None if gemini_api_key.is_some() => LlmProvider::Gemini,
            None => LlmProvider::Ollama,
        };

        let cache_expiry = match get("CACHE_EXPIRY_DAYS") {
            Some(value) => {
                let days: u64 = parse_number("CACHE_EXPIRY_DAYS", value.clone())?;
                let secs = days.checked_mul(SECONDS_PER_DAY).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        name: "CACHE_EXPIRY_DAYS",
                        value,
                        reason: "number of days is too large".to_string(),
                    }
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => defaults.cache_expiry,
        };

        let port = match get("PORT") {
            Some(value) => parse_number("PORT", value)?,
            None => defaults.port,
        };

        let debug = get("SAMARTH_DEBUG")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.debug);

        Ok(Self {
            llm_provider,
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            ollama_host: get("OLLAMA_HOST").unwrap_or(defaults.ollama_host),
            ollama_model: get("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            data_gov_api_key: get("DATA_GOV_IN_API_KEY").unwrap_or_default(),
            cache_dir: get("SAMARTH_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            cache_expiry,
            port,
            debug,
        })
    }

    /// Returns the model name for the selected provider.
    pub fn llm_model(&self) -> &str {
        match self.llm_provider {
            LlmProvider::Gemini => &self.gemini_model,
            LlmProvider::Ollama => &self.ollama_model,
        }
    }
}

fn parse_number<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.llm_provider, LlmProvider::Ollama);
        assert_eq!(config.port, 5000);
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.ollama_host, "http://localhost:11434");
        assert_eq!(
            config.cache_expiry,
            Some(Duration::from_secs(7 * SECONDS_PER_DAY))
        );
        assert!(config.data_gov_api_key.is_empty());
        assert!(!config.debug);
    }

    #[test]
    fn gemini_key_selects_gemini_provider() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.llm_provider, LlmProvider::Gemini);
        assert_eq!(config.llm_model(), "gemini-pro");
    }

    #[test]
    fn explicit_provider_overrides_key_detection() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("LLM_PROVIDER", "ollama"),
            ("OLLAMA_MODEL", "gemma3:4b"),
        ]))
        .unwrap();
        assert_eq!(config.llm_provider, LlmProvider::Ollama);
        assert_eq!(config.llm_model(), "gemma3:4b");
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.llm_provider, LlmProvider::Ollama);
    }

    #[test]
    fn zero_expiry_days_disables_expiry() {
        let config = Config::from_lookup(lookup_from(&[("CACHE_EXPIRY_DAYS", "0")])).unwrap();
        assert_eq!(config.cache_expiry, None);
    }

    #[test]
    fn oversized_expiry_days_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("CACHE_EXPIRY_DAYS", "300000000000000")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "CACHE_EXPIRY_DAYS",
                ..
            }
        ));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn invalid_provider_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("LLM_PROVIDER", "gpt")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "LLM_PROVIDER",
                ..
            }
        ));
    }

    #[test]
    fn cache_dir_and_debug_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("SAMARTH_CACHE_DIR", "/tmp/samarth-cache"),
            ("SAMARTH_DEBUG", "true"),
        ]))
        .unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/samarth-cache"));
        assert!(config.debug);
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        unsafe {
            std::env::set_var("DATA_GOV_IN_API_KEY", "gov-key");
            std::env::set_var("PORT", "8080");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.data_gov_api_key, "gov-key");
        assert_eq!(config.port, 8080);

        unsafe {
            std::env::remove_var("DATA_GOV_IN_API_KEY");
            std::env::remove_var("PORT");
        }
    }
}
