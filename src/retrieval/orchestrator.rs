//! Per-request aggregation of every dataset a plan needs.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::datasets::{DatasetKey, DatasetPayload, DatasetRegistry};
use crate::plan::QueryPlan;

use super::fetcher::DatasetSource;
use super::select::select_datasets;

/// One dataset in an [`AggregatedResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub key: DatasetKey,
    pub description: String,
    pub locator: String,
    pub payload: DatasetPayload,
    /// Which fetch branch produced the payload.
    pub branch: &'static str,
}

/// Filtered datasets in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResult {
    entries: Vec<DatasetEntry>,
}

impl AggregatedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any earlier one with the same description.
    pub fn insert(&mut self, entry: DatasetEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.description == entry.description)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn get(&self, key: DatasetKey) -> Option<&DatasetEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> Vec<DatasetKey> {
        self.entries.iter().map(|e| e.key).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs selection, fetching and filtering for a plan.
pub struct DataFetchOrchestrator {
    registry: DatasetRegistry,
    source: Arc<dyn DatasetSource>,
}

impl DataFetchOrchestrator {
    pub fn new(registry: DatasetRegistry, source: Arc<dyn DatasetSource>) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Fetches every dataset selected for `plan`.
    ///
    /// A dataset whose source returns an error or panics is logged and left
    /// out; the remaining datasets are still fetched.
    pub fn fetch_all(&self, plan: &QueryPlan) -> AggregatedResult {
        let mut result = AggregatedResult::new();

        for key in select_datasets(plan) {
            let Some(descriptor) = self.registry.get(key) else {
                warn!(dataset = %key, "selected dataset is not registered, skipping");
                continue;
            };

            let fetched = match catch_unwind(AssertUnwindSafe(|| self.source.fetch(key, plan))) {
                Ok(fetched) => fetched,
                Err(panic) => {
                    warn!(
                        dataset = %key,
                        panic = panic_message(&*panic),
                        "dataset fetch panicked, skipping"
                    );
                    continue;
                }
            };

            match fetched {
                Ok(outcome) => {
                    debug!(
                        dataset = %key,
                        branch = outcome.branch(),
                        records = outcome.payload().len(),
                        "dataset ready"
                    );
                    let branch = outcome.branch();
                    result.insert(DatasetEntry {
                        key,
                        description: descriptor.description.clone(),
                        locator: descriptor.locator.clone(),
                        payload: outcome.into_payload(),
                        branch,
                    });
                }
                Err(e) => warn!(dataset = %key, error = %e, "error fetching dataset, skipping"),
            }
        }

        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{FetchError, fixture};
    use crate::retrieval::fetcher::FetchOutcome;
    use crate::retrieval::filter::filter_payload;
    use std::sync::Mutex;

    /// Serves fixtures, failing for the keys listed in `failing`.
    struct FixtureSource {
        failing: Vec<DatasetKey>,
        requested: Mutex<Vec<DatasetKey>>,
    }

    impl FixtureSource {
        fn new(failing: &[DatasetKey]) -> Arc<Self> {
            Arc::new(Self {
                failing: failing.to_vec(),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    impl DatasetSource for FixtureSource {
        fn fetch(&self, key: DatasetKey, plan: &QueryPlan) -> Result<FetchOutcome, FetchError> {
            self.requested.lock().unwrap().push(key);
            if self.failing.contains(&key) {
                return Err(FetchError::Source(format!("{key} exploded")));
            }
            let payload = fixture(key).map_or(DatasetPayload::Empty, DatasetPayload::from);
            Ok(FetchOutcome::Hit(filter_payload(payload, plan)))
        }
    }

    fn orchestrator(source: Arc<FixtureSource>) -> DataFetchOrchestrator {
        DataFetchOrchestrator::new(DatasetRegistry::builtin(), source)
    }

    #[test]
    fn empty_plan_fetches_only_agricultural_statistics() {
        let source = FixtureSource::new(&[]);
        let result = orchestrator(source.clone()).fetch_all(&QueryPlan::default());

        assert_eq!(result.keys(), vec![DatasetKey::AgriculturalStatistics]);
        let entry = &result.entries()[0];
        assert_eq!(entry.description, "State-wise Agricultural Statistics");
        assert_eq!(entry.payload, DatasetPayload::Empty);
        assert_eq!(*source.requested.lock().unwrap(), vec![DatasetKey::AgriculturalStatistics]);
    }

    #[test]
    fn failing_dataset_is_skipped() {
        let source = FixtureSource::new(&[DatasetKey::CropProduction]);
        let plan = QueryPlan {
            crops: vec!["Rice".to_string()],
            ..QueryPlan::default()
        };

        let result = orchestrator(source.clone()).fetch_all(&plan);

        assert_eq!(result.keys(), vec![DatasetKey::AgriculturalStatistics]);
        assert_eq!(source.requested.lock().unwrap().len(), 2);
    }

    /// Panics for one key and serves fixtures for the rest.
    struct PanickingSource {
        broken: DatasetKey,
    }

    impl DatasetSource for PanickingSource {
        fn fetch(&self, key: DatasetKey, plan: &QueryPlan) -> Result<FetchOutcome, FetchError> {
            if key == self.broken {
                panic!("{key} source is broken");
            }
            let payload = fixture(key).map_or(DatasetPayload::Empty, DatasetPayload::from);
            Ok(FetchOutcome::Hit(filter_payload(payload, plan)))
        }
    }

    #[test]
    fn panicking_dataset_is_skipped() {
        let orchestrator = DataFetchOrchestrator::new(
            DatasetRegistry::builtin(),
            Arc::new(PanickingSource {
                broken: DatasetKey::CropProduction,
            }),
        );
        let plan = QueryPlan {
            crops: vec!["Rice".to_string()],
            ..QueryPlan::default()
        };

        let result = orchestrator.fetch_all(&plan);

        assert_eq!(result.keys(), vec![DatasetKey::AgriculturalStatistics]);
        assert_eq!(result.entries()[0].payload, DatasetPayload::Empty);
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(&*literal), "boom");
        assert_eq!(panic_message(&*owned), "bang");
        assert_eq!(panic_message(&*other), "unknown panic");
    }

    #[test]
    fn entries_follow_key_order_with_locators() {
        let plan = QueryPlan {
            data_types: vec!["production".to_string(), "rainfall".to_string()],
            ..QueryPlan::default()
        };
        let result = orchestrator(FixtureSource::new(&[])).fetch_all(&plan);

        assert_eq!(result.keys(), DatasetKey::ALL.to_vec());
        let registry = DatasetRegistry::builtin();
        for entry in result.entries() {
            assert_eq!(entry.locator, registry.get(entry.key).unwrap().locator);
            assert_eq!(entry.branch, "cache");
        }
        assert_eq!(result.get(DatasetKey::CropProduction).unwrap().payload.len(), 9);
    }

    #[test]
    fn every_source_failing_yields_empty_result() {
        let source = FixtureSource::new(&DatasetKey::ALL);
        let result = orchestrator(source).fetch_all(&QueryPlan::fallback());
        assert!(result.is_empty());
    }

    #[test]
    fn insert_replaces_same_description() {
        let mut result = AggregatedResult::new();
        let entry = DatasetEntry {
            key: DatasetKey::RainfallData,
            description: "Rain".to_string(),
            locator: "https://example.invalid/a".to_string(),
            payload: DatasetPayload::Empty,
            branch: "fixture",
        };
        result.insert(entry.clone());
        result.insert(DatasetEntry {
            locator: "https://example.invalid/b".to_string(),
            ..entry
        });

        assert_eq!(result.len(), 1);
        assert_eq!(result.entries()[0].locator, "https://example.invalid/b");
    }
}
