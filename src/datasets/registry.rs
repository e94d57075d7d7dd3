//! Known data.gov.in datasets.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Stable identifier of a dataset.
///
/// Variant order is the order datasets are fetched and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKey {
    CropProduction,
    RainfallData,
    AgriculturalStatistics,
}

impl DatasetKey {
    pub const ALL: [DatasetKey; 3] = [
        DatasetKey::CropProduction,
        DatasetKey::RainfallData,
        DatasetKey::AgriculturalStatistics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CropProduction => "crop_production",
            Self::RainfallData => "rainfall_data",
            Self::AgriculturalStatistics => "agricultural_statistics",
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown dataset key '{s}'"))
    }
}

/// Where a dataset lives and how to describe it to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub key: DatasetKey,
    pub resource_id: String,
    pub locator: String,
    pub description: String,
}

/// Entry in the public dataset listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetListing {
    pub key: DatasetKey,
    pub description: String,
    pub url: String,
}

/// Immutable key → descriptor mapping, fixed at startup.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    descriptors: Vec<DatasetDescriptor>,
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DatasetRegistry {
    /// The data.gov.in resources the application knows about.
    pub fn builtin() -> Self {
        let entry = |key, resource_id: &str, locator: &str, description: &str| DatasetDescriptor {
            key,
            resource_id: resource_id.to_string(),
            locator: locator.to_string(),
            description: description.to_string(),
        };

        Self {
            descriptors: vec![
                entry(
                    DatasetKey::CropProduction,
                    "e75f8edb-1c01-4c6e-95fd-9c98f9e4e0cd",
                    "https://api.data.gov.in/resource/e75f8edb-1c01-4c6e-95fd-9c98f9e4e0cd",
                    "District-wise Crop Production Statistics",
                ),
                entry(
                    DatasetKey::RainfallData,
                    "rainfall-2018-2023",
                    "https://data.gov.in/resource/rainfall-district-wise",
                    "IMD District-wise Rainfall Data",
                ),
                entry(
                    DatasetKey::AgriculturalStatistics,
                    "agri-stats-state",
                    "https://data.gov.in/resource/agricultural-statistics",
                    "State-wise Agricultural Statistics",
                ),
            ],
        }
    }

    /// Replaces the locator of one dataset. Used to point at mirrors.
    #[must_use]
    pub fn with_locator(mut self, key: DatasetKey, locator: impl Into<String>) -> Self {
        if let Some(descriptor) = self.descriptors.iter_mut().find(|d| d.key == key) {
            descriptor.locator = locator.into();
        }
        self
    }

    pub fn get(&self, key: DatasetKey) -> Option<&DatasetDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.descriptors.iter()
    }

    /// Lists every dataset as `{key, description, url}`.
    pub fn list_available_datasets(&self) -> Vec<DatasetListing> {
        self.descriptors
            .iter()
            .map(|d| DatasetListing {
                key: d.key,
                description: d.description.clone(),
                url: d.locator.clone(),
            })
            .collect()
    }
}
