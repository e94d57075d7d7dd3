//! Dataset selection from a query plan.

use std::collections::BTreeSet;

use crate::datasets::DatasetKey;
use crate::plan::QueryPlan;

/// Decides which datasets a plan needs.
///
/// Errs towards including too much: a missing dataset silently weakens the
/// answer, an extra one only costs a fetch. `AgriculturalStatistics` is always
/// included, so the result is never empty.
pub fn select_datasets(plan: &QueryPlan) -> BTreeSet<DatasetKey> {
    let mut keys = BTreeSet::new();

    if plan.has_data_type("production") || !plan.crops.is_empty() {
        keys.insert(DatasetKey::CropProduction);
    }

    if plan.has_data_type("rainfall") || plan.data_type_mentions("climate") {
        keys.insert(DatasetKey::RainfallData);
    }

    keys.insert(DatasetKey::AgriculturalStatistics);
    keys
}
