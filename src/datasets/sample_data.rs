//! Realistic sample datasets for offline use.
//!
//! `seed_cache` writes these into the dataset cache so the whole pipeline can
//! run without network access or API keys.

use serde_json::Value;

use super::cache::{CacheError, DatasetCache};
use super::registry::DatasetKey;
use super::table::Table;

fn text(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

fn floats(values: &[f64]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

fn cycled(values: Vec<Value>, times: usize) -> Vec<Value> {
    let len = values.len();
    values.into_iter().cycle().take(len * times).collect()
}

fn years(start: i64, end: i64, each: usize) -> Vec<Value> {
    (start..=end)
        .flat_map(|year| std::iter::repeat_n(Value::from(year), each))
        .collect()
}

/// Twelve districts across four states, 2021–2023.
pub fn crop_production() -> Table {
    Table::from_columns(vec![
        (
            "state",
            cycled(
                text(&[
                    "Maharashtra", "Maharashtra", "Maharashtra", "Punjab", "Punjab", "Punjab",
                    "Kerala", "Kerala", "Kerala", "Uttar Pradesh", "Uttar Pradesh",
                    "Uttar Pradesh",
                ]),
                3,
            ),
        ),
        (
            "district",
            cycled(
                text(&[
                    "Pune", "Nagpur", "Mumbai", "Ludhiana", "Amritsar", "Patiala", "Ernakulam",
                    "Thrissur", "Palakkad", "Lucknow", "Kanpur", "Varanasi",
                ]),
                3,
            ),
        ),
        (
            "crop",
            cycled(
                text(&[
                    "Rice", "Cotton", "Wheat", "Wheat", "Rice", "Cotton", "Coconut", "Rice",
                    "Banana", "Wheat", "Rice", "Sugarcane",
                ]),
                3,
            ),
        ),
        (
            "crop_type",
            cycled(
                text(&[
                    "Cereals", "Cash Crops", "Cereals", "Cereals", "Cereals", "Cash Crops",
                    "Plantation", "Cereals", "Fruits", "Cereals", "Cereals", "Cash Crops",
                ]),
                3,
            ),
        ),
        ("year", years(2021, 2023, 12)),
        (
            "production_tonnes",
            ints(&[
                1_500_000, 800_000, 600_000, 2_500_000, 900_000, 500_000, 400_000, 350_000,
                200_000, 3_000_000, 1_200_000, 1_500_000, //
                1_550_000, 820_000, 610_000, 2_600_000, 920_000, 510_000, 410_000, 360_000,
                210_000, 3_100_000, 1_250_000, 1_550_000, //
                1_600_000, 850_000, 620_000, 2_700_000, 950_000, 530_000, 420_000, 370_000,
                220_000, 3_200_000, 1_300_000, 1_600_000,
            ]),
        ),
        (
            "area_hectares",
            ints(&[
                50_000, 30_000, 25_000, 60_000, 35_000, 20_000, 15_000, 14_000, 8_000, 70_000,
                40_000, 45_000, //
                51_000, 31_000, 25_500, 61_000, 35_500, 20_500, 15_200, 14_200, 8_100, 71_000,
                41_000, 45_500, //
                52_000, 32_000, 26_000, 62_000, 36_000, 21_000, 15_400, 14_400, 8_200, 72_000,
                42_000, 46_000,
            ]),
        ),
        (
            "yield_kg_per_hectare",
            cycled(
                ints(&[
                    30_000, 26_667, 24_000, 41_667, 25_714, 25_000, 26_667, 25_000, 25_000,
                    42_857, 30_000, 33_333,
                ]),
                3,
            ),
        ),
    ])
}

/// Four states, 2019–2023.
pub fn rainfall_data() -> Table {
    Table::from_columns(vec![
        (
            "state",
            cycled(text(&["Maharashtra", "Punjab", "Kerala", "Uttar Pradesh"]), 5),
        ),
        ("year", years(2019, 2023, 4)),
        (
            "annual_rainfall_mm",
            ints(&[
                850, 620, 3100, 980, 820, 600, 3050, 960, 880, 640, 3150, 1000, 900, 660, 3200,
                1020, 870, 630, 3180, 990,
            ]),
        ),
        (
            "monsoon_rainfall_mm",
            ints(&[
                720, 500, 2800, 850, 700, 480, 2750, 830, 750, 520, 2850, 870, 770, 540, 2900,
                890, 740, 510, 2880, 860,
            ]),
        ),
        (
            "rainy_days",
            ints(&[
                65, 45, 150, 70, 62, 42, 148, 68, 68, 47, 152, 72, 70, 49, 155, 74, 66, 46, 153,
                71,
            ]),
        ),
    ])
}

/// Four states, 2021–2023.
pub fn agricultural_statistics() -> Table {
    Table::from_columns(vec![
        (
            "state",
            cycled(text(&["Maharashtra", "Punjab", "Kerala", "Uttar Pradesh"]), 3),
        ),
        ("year", years(2021, 2023, 4)),
        (
            "total_agricultural_area_hectares",
            ints(&[
                225_000, 175_000, 45_000, 250_000, 226_000, 176_000, 45_200, 251_000, 227_000,
                177_000, 45_400, 252_000,
            ]),
        ),
        (
            "irrigated_area_hectares",
            ints(&[
                180_000, 160_000, 35_000, 220_000, 182_000, 162_000, 35_500, 222_000, 184_000,
                164_000, 36_000, 224_000,
            ]),
        ),
        (
            "number_of_farmers",
            ints(&[
                138_000, 152_000, 98_000, 178_000, 140_000, 154_000, 99_000, 180_000, 142_000,
                156_000, 100_000, 182_000,
            ]),
        ),
        (
            "avg_farm_size_hectares",
            cycled(floats(&[1.63, 1.15, 0.46, 1.40]), 3),
        ),
    ])
}

/// The sample table for `key`.
pub fn sample_table(key: DatasetKey) -> Table {
    match key {
        DatasetKey::CropProduction => crop_production(),
        DatasetKey::RainfallData => rainfall_data(),
        DatasetKey::AgriculturalStatistics => agricultural_statistics(),
    }
}

/// Writes every sample dataset into `cache`, replacing existing entries.
///
/// # Errors
///
/// Stops at the first dataset that cannot be written.
pub fn seed_cache(cache: &DatasetCache) -> Result<Vec<(DatasetKey, usize)>, CacheError> {
    DatasetKey::ALL
        .into_iter()
        .map(|key| {
            let table = sample_table(key);
            cache.store(key, &table)?;
            Ok((key, table.len()))
        })
        .collect()
}
