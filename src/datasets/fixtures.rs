//! Small built-in tables served when live retrieval is unavailable.

use serde_json::{Value, json};

use super::registry::DatasetKey;
use super::table::Table;

fn repeat(values: &[Value], times: usize) -> Vec<Value> {
    values.iter().cloned().cycle().take(values.len() * times).collect()
}

/// Returns the fixture for `key`, or `None` if the dataset has none.
pub fn fixture(key: DatasetKey) -> Option<Table> {
    match key {
        DatasetKey::CropProduction => Some(Table::from_columns(vec![
            ("state", repeat(&[json!("Maharashtra"), json!("Punjab"), json!("Kerala")], 3)),
            ("district", repeat(&[json!("Pune"), json!("Ludhiana"), json!("Ernakulam")], 3)),
            ("crop", repeat(&[json!("Rice"), json!("Wheat"), json!("Coconut")], 3)),
            ("year", repeat(&[json!(2021), json!(2022), json!(2023)], 3)),
            ("production", repeat(&[json!(1_500_000), json!(2_000_000), json!(500_000)], 3)),
            ("area", repeat(&[json!(50_000), json!(60_000), json!(30_000)], 3)),
        ])),
        DatasetKey::RainfallData => Some(Table::from_columns(vec![
            ("state", repeat(&[json!("Maharashtra"), json!("Punjab")], 3)),
            ("year", repeat(&[json!(2021), json!(2022), json!(2023)], 2)),
            ("annual_rainfall", repeat(&[json!(850), json!(620)], 3)),
        ])),
        DatasetKey::AgriculturalStatistics => None,
    }
}
