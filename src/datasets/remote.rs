//! Remote dataset retrieval from the data.gov.in resource API.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::registry::{DatasetDescriptor, DatasetKey};
use super::table::DatasetPayload;

/// Maximum number of records requested per dataset.
pub const RECORD_LIMIT: u32 = 10_000;

/// Default bound on a single remote fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from fetching a dataset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failures, DNS resolution, body read errors
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The body was not JSON
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The body was JSON but had no `records` array
    #[error("Response has no 'records' array")]
    MissingRecords,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Dataset {0} is not registered")]
    Unregistered(DatasetKey),

    /// Failure reported by a dataset source other than the built-in fetcher
    #[error("Dataset source failed: {0}")]
    Source(String),
}

impl FetchError {
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Something that can produce the records of a dataset.
///
/// Implemented by [`DataGovClient`] and by stubs in tests.
pub trait RemoteSource: Send + Sync {
    fn fetch_records(&self, descriptor: &DatasetDescriptor) -> Result<DatasetPayload, FetchError>;
}

/// Builder for `DataGovClient`.
#[derive(Debug)]
pub struct DataGovClientBuilder {
    api_key: String,
    timeout: Duration,
    limit: u32,
}

impl Default for DataGovClientBuilder {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout: FETCH_TIMEOUT,
            limit: RECORD_LIMIT,
        }
    }
}

impl DataGovClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data.gov.in API key sent as the `api-key` parameter.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Sets the total request timeout. A timed-out request is an ordinary
    /// fetch failure.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// # Errors
    ///
    /// Returns `FetchError::Network` if the HTTP client cannot be created.
    pub fn build(self) -> Result<DataGovClient, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(FetchError::Network)?;

        Ok(DataGovClient {
            client,
            api_key: self.api_key,
            limit: self.limit,
        })
    }
}

/// Blocking client for data.gov.in resources.
pub struct DataGovClient {
    client: reqwest::blocking::Client,
    api_key: String,
    limit: u32,
}

impl RemoteSource for DataGovClient {
    fn fetch_records(&self, descriptor: &DatasetDescriptor) -> Result<DatasetPayload, FetchError> {
        let url = reqwest::Url::parse(&descriptor.locator)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", descriptor.locator, e)))?;
        let limit = self.limit.to_string();

        let response = self
            .client
            .get(url)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(FetchError::from_transport)?;
        let json: Value = serde_json::from_str(&body).map_err(FetchError::Serialization)?;
        parse_records(json)
    }
}

/// Extracts and classifies the `records` array of a resource response.
fn parse_records(json: Value) -> Result<DatasetPayload, FetchError> {
    match json {
        Value::Object(mut body) => match body.remove("records") {
            Some(Value::Array(records)) => Ok(DatasetPayload::from_records(records)),
            _ => Err(FetchError::MissingRecords),
        },
        _ => Err(FetchError::MissingRecords),
    }
}
