//! Cache → remote → fixture resolution for a single dataset.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::datasets::{
    DataGovClientBuilder, DatasetCache, DatasetKey, DatasetPayload, DatasetRegistry, FetchError,
    RemoteSource, fixture,
};
use crate::plan::QueryPlan;

use super::filter::filter_payload;

/// Which branch of the fallback chain produced a dataset.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Served from a fresh cache entry.
    Hit(DatasetPayload),
    /// Retrieved from the remote source and written to the cache.
    Fetched(DatasetPayload),
    /// Remote retrieval failed; the fixture (or nothing) was served instead.
    Degraded {
        payload: DatasetPayload,
        reason: FetchError,
    },
}

impl FetchOutcome {
    pub fn payload(&self) -> &DatasetPayload {
        match self {
            Self::Hit(payload) | Self::Fetched(payload) => payload,
            Self::Degraded { payload, .. } => payload,
        }
    }

    pub fn into_payload(self) -> DatasetPayload {
        match self {
            Self::Hit(payload) | Self::Fetched(payload) => payload,
            Self::Degraded { payload, .. } => payload,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Short branch label for logs and responses.
    pub fn branch(&self) -> &'static str {
        match self {
            Self::Hit(_) => "cache",
            Self::Fetched(_) => "remote",
            Self::Degraded { .. } => "fixture",
        }
    }
}

/// Resolves a dataset key to filtered data.
///
/// The orchestrator depends on this trait so tests can substitute sources
/// that fail in specific ways.
pub trait DatasetSource: Send + Sync {
    /// # Errors
    ///
    /// Implementations return an error only when no payload at all can be
    /// produced for `key`.
    fn fetch(&self, key: DatasetKey, plan: &QueryPlan) -> Result<FetchOutcome, FetchError>;
}

/// The production `DatasetSource`: cache first, then the remote API, then
/// the built-in fixture.
pub struct DatasetFetcher {
    registry: DatasetRegistry,
    cache: DatasetCache,
    remote: Arc<dyn RemoteSource>,
}

impl DatasetFetcher {
    pub fn new(registry: DatasetRegistry, cache: DatasetCache, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            registry,
            cache,
            remote,
        }
    }

    /// Builds a fetcher backed by data.gov.in and the configured cache.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network` if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let remote = DataGovClientBuilder::new()
            .api_key(config.data_gov_api_key.clone())
            .build()?;
        Ok(Self::new(
            DatasetRegistry::builtin(),
            DatasetCache::new(config.cache_dir.clone(), config.cache_expiry),
            Arc::new(remote),
        ))
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    fn cached(&self, key: DatasetKey) -> Option<DatasetPayload> {
        match self.cache.load(key) {
            Ok(Some(table)) => Some(DatasetPayload::from(table)),
            Ok(None) => None,
            Err(e) => {
                warn!(dataset = %key, error = %e, "unreadable cache entry, treating as miss");
                None
            }
        }
    }

    fn persist(&self, key: DatasetKey, payload: &DatasetPayload) {
        let Some(table) = payload.as_table() else {
            debug!(dataset = %key, "payload is not tabular, not caching");
            return;
        };
        match self.cache.store(key, table) {
            Ok(path) => debug!(dataset = %key, path = %path.display(), "cached dataset"),
            Err(e) => warn!(dataset = %key, error = %e, "failed to write cache entry"),
        }
    }
}

impl DatasetSource for DatasetFetcher {
    fn fetch(&self, key: DatasetKey, plan: &QueryPlan) -> Result<FetchOutcome, FetchError> {
        if let Some(payload) = self.cached(key) {
            debug!(dataset = %key, records = payload.len(), "cache hit");
            return Ok(FetchOutcome::Hit(filter_payload(payload, plan)));
        }

        let descriptor = self.registry.get(key).ok_or(FetchError::Unregistered(key))?;

        match self.remote.fetch_records(descriptor) {
            Ok(payload) => {
                info!(dataset = %key, records = payload.len(), "fetched from remote");
                self.persist(key, &payload);
                Ok(FetchOutcome::Fetched(filter_payload(payload, plan)))
            }
            Err(reason) => {
                warn!(dataset = %key, error = %reason, "remote fetch failed, using fixture");
                let payload = fixture(key).map_or(DatasetPayload::Empty, DatasetPayload::from);
                Ok(FetchOutcome::Degraded {
                    payload: filter_payload(payload, plan),
                    reason,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{DatasetDescriptor, Table};
    use crate::plan::TimePeriod;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct StubRemote {
        response: Mutex<Option<Result<DatasetPayload, FetchError>>>,
        calls: AtomicUsize,
    }

    impl StubRemote {
        fn returning(response: Result<DatasetPayload, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RemoteSource for StubRemote {
        fn fetch_records(&self, _: &DatasetDescriptor) -> Result<DatasetPayload, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(FetchError::Source("stub exhausted".to_string())))
        }
    }

    fn remote_table() -> Table {
        Table::from_columns(vec![
            ("state", vec![json!("Goa"), json!("Assam")]),
            ("crop", vec![json!("Rice"), json!("Tea")]),
            ("year", vec![json!(2020), json!(2021)]),
        ])
    }

    fn fetcher_with(dir: &std::path::Path, remote: Arc<StubRemote>) -> DatasetFetcher {
        DatasetFetcher::new(
            DatasetRegistry::builtin(),
            DatasetCache::new(dir, None),
            remote,
        )
    }

    #[test]
    fn cache_hit_skips_remote() {
        let dir = tempdir().unwrap();
        let remote = StubRemote::returning(Ok(DatasetPayload::Empty));
        let fetcher = fetcher_with(dir.path(), remote.clone());
        fetcher
            .cache()
            .store(DatasetKey::CropProduction, &remote_table())
            .unwrap();

        let outcome = fetcher
            .fetch(DatasetKey::CropProduction, &QueryPlan::default())
            .unwrap();

        assert!(outcome.is_hit());
        assert_eq!(outcome.payload().len(), 2);
        assert_eq!(remote.calls(), 0);
    }

    #[test]
    fn cache_hit_is_filtered() {
        let dir = tempdir().unwrap();
        let fetcher = fetcher_with(dir.path(), StubRemote::returning(Ok(DatasetPayload::Empty)));
        fetcher
            .cache()
            .store(DatasetKey::CropProduction, &remote_table())
            .unwrap();

        let plan = QueryPlan {
            crops: vec!["Tea".to_string()],
            ..QueryPlan::default()
        };
        let outcome = fetcher.fetch(DatasetKey::CropProduction, &plan).unwrap();
        assert_eq!(outcome.payload().len(), 1);
    }

    #[test]
    fn remote_success_is_cached_and_filtered() {
        let dir = tempdir().unwrap();
        let remote = StubRemote::returning(Ok(DatasetPayload::from(remote_table())));
        let fetcher = fetcher_with(dir.path(), remote.clone());

        let plan = QueryPlan {
            time_period: Some(TimePeriod::new(2021, 2021)),
            ..QueryPlan::default()
        };
        let outcome = fetcher.fetch(DatasetKey::CropProduction, &plan).unwrap();

        assert!(outcome.is_fetched());
        assert_eq!(outcome.branch(), "remote");
        assert_eq!(outcome.payload().len(), 1);
        assert_eq!(remote.calls(), 1);

        // The unfiltered snapshot is what gets persisted.
        let cached = fetcher.cache().load(DatasetKey::CropProduction).unwrap().unwrap();
        assert_eq!(cached, remote_table());

        let again = fetcher.fetch(DatasetKey::CropProduction, &plan).unwrap();
        assert!(again.is_hit());
        assert_eq!(remote.calls(), 1);
    }

    #[test]
    fn remote_failure_serves_filtered_fixture() {
        let dir = tempdir().unwrap();
        let remote = StubRemote::returning(Err(FetchError::Http { status: 500 }));
        let fetcher = fetcher_with(dir.path(), remote);

        let plan = QueryPlan {
            states: vec!["Punjab".to_string()],
            ..QueryPlan::default()
        };
        let outcome = fetcher.fetch(DatasetKey::RainfallData, &plan).unwrap();

        match &outcome {
            FetchOutcome::Degraded { payload, reason } => {
                assert!(matches!(reason, FetchError::Http { status: 500 }));
                assert_eq!(payload.len(), 3);
            }
            other => panic!("expected Degraded, got {other:?}"),
        }
        assert!(!fetcher.cache().path_for(DatasetKey::RainfallData).exists());
    }

    #[test]
    fn remote_failure_without_fixture_is_empty() {
        let dir = tempdir().unwrap();
        let fetcher = fetcher_with(dir.path(), StubRemote::returning(Err(FetchError::MissingRecords)));

        let outcome = fetcher
            .fetch(DatasetKey::AgriculturalStatistics, &QueryPlan::default())
            .unwrap();

        assert!(outcome.is_degraded());
        assert_eq!(outcome.into_payload(), DatasetPayload::Empty);
    }

    #[test]
    fn unreadable_cache_entry_is_a_miss() {
        let dir = tempdir().unwrap();
        let remote = StubRemote::returning(Ok(DatasetPayload::from(remote_table())));
        let fetcher = fetcher_with(dir.path(), remote.clone());

        // Ragged CSV rows are a parse error for the csv reader.
        std::fs::write(
            fetcher.cache().path_for(DatasetKey::CropProduction),
            "state,crop\nGoa\nAssam,Tea,extra\n",
        )
        .unwrap();

        let outcome = fetcher
            .fetch(DatasetKey::CropProduction, &QueryPlan::default())
            .unwrap();
        assert!(outcome.is_fetched());
        assert_eq!(remote.calls(), 1);
    }

    #[test]
    fn list_payloads_are_not_cached() {
        let dir = tempdir().unwrap();
        let remote =
            StubRemote::returning(Ok(DatasetPayload::List(vec![json!("a"), json!("b")])));
        let fetcher = fetcher_with(dir.path(), remote);

        let outcome = fetcher
            .fetch(DatasetKey::RainfallData, &QueryPlan::default())
            .unwrap();
        assert!(outcome.is_fetched());
        assert_eq!(outcome.payload().len(), 2);
        assert!(!fetcher.cache().path_for(DatasetKey::RainfallData).exists());
    }
}
