//! Structured retrieval intent extracted from a question.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Year bounds used when a time period leaves one side open.
pub const MIN_YEAR: i64 = 0;
pub const MAX_YEAR: i64 = 9999;

/// What kind of analysis the question asks for. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisType {
    Comparison,
    Trend,
    Correlation,
    Recommendation,
    #[default]
    General,
}

impl AnalysisType {
    /// Parses a free-text analysis type; anything unrecognised is `General`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "comparison" => Self::Comparison,
            "trend" => Self::Trend,
            "correlation" => Self::Correlation,
            "recommendation" => Self::Recommendation,
            _ => Self::General,
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison => write!(f, "comparison"),
            Self::Trend => write!(f, "trend"),
            Self::Correlation => write!(f, "correlation"),
            Self::Recommendation => write!(f, "recommendation"),
            Self::General => write!(f, "general"),
        }
    }
}

impl Serialize for AnalysisType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AnalysisType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// Inclusive year window. Either bound may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    #[serde(default, deserialize_with = "lenient_year")]
    pub start_year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub end_year: Option<i64>,
}

impl TimePeriod {
    pub fn new(start_year: i64, end_year: i64) -> Self {
        Self {
            start_year: Some(start_year),
            end_year: Some(end_year),
        }
    }

    /// True when neither bound is set; such a period filters nothing.
    pub fn is_unbounded(&self) -> bool {
        self.start_year.is_none() && self.end_year.is_none()
    }

    /// Bounds with open sides replaced by `MIN_YEAR`/`MAX_YEAR`.
    pub fn bounds(&self) -> (i64, i64) {
        (
            self.start_year.unwrap_or(MIN_YEAR),
            self.end_year.unwrap_or(MAX_YEAR),
        )
    }
}

/// Retrieval intent for one question.
///
/// Every field is optional on the wire; list fields accept `null`, a single
/// string, or an array of strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    #[serde(default, deserialize_with = "string_list")]
    pub states: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub districts: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub crops: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub crop_types: Vec<String>,
    #[serde(default)]
    pub time_period: Option<TimePeriod>,
    #[serde(default, deserialize_with = "string_list")]
    pub data_types: Vec<String>,
    #[serde(default)]
    pub analysis_type: AnalysisType,
    #[serde(default, deserialize_with = "string_list")]
    pub key_metrics: Vec<String>,
}

impl QueryPlan {
    /// The plan used when a question could not be interpreted.
    pub fn fallback() -> Self {
        Self {
            time_period: Some(TimePeriod::new(2019, 2024)),
            data_types: vec!["production".to_string()],
            analysis_type: AnalysisType::General,
            ..Self::default()
        }
    }

    /// True if `data_types` contains `value` exactly.
    pub fn has_data_type(&self, value: &str) -> bool {
        self.data_types.iter().any(|t| t == value)
    }

    /// True if any entry of `data_types` contains `needle`.
    pub fn data_type_mentions(&self, needle: &str) -> bool {
        self.data_types.iter().any(|t| t.contains(needle))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<Option<String>>),
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let list = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(items)) => items.into_iter().flatten().collect(),
    };
    Ok(list
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Number(i64),
    Text(String),
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<YearValue>::deserialize(deserializer)? {
        Some(YearValue::Number(n)) => Some(n),
        Some(YearValue::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analysis_type_parse_falls_back_to_general() {
        assert_eq!(AnalysisType::parse("Trend"), AnalysisType::Trend);
        assert_eq!(AnalysisType::parse("forecast"), AnalysisType::General);
    }

    #[test]
    fn analysis_type_display() {
        assert_eq!(AnalysisType::Correlation.to_string(), "correlation");
        assert_eq!(AnalysisType::General.to_string(), "general");
    }

    #[test]
    fn empty_object_decodes_to_default_plan() {
        let plan: QueryPlan = serde_json::from_value(json!({})).unwrap();
        assert_eq!(plan, QueryPlan::default());
    }

    #[test]
    fn full_plan_decodes() {
        let plan: QueryPlan = serde_json::from_value(json!({
            "states": ["Maharashtra", "Punjab"],
            "districts": ["Pune"],
            "crops": ["Rice"],
            "crop_types": ["cereals"],
            "time_period": {"start_year": 2018, "end_year": 2023},
            "data_types": ["production", "rainfall"],
            "analysis_type": "comparison",
            "key_metrics": ["average_rainfall"]
        }))
        .unwrap();

        assert_eq!(plan.states, vec!["Maharashtra", "Punjab"]);
        assert_eq!(plan.time_period, Some(TimePeriod::new(2018, 2023)));
        assert_eq!(plan.analysis_type, AnalysisType::Comparison);
        assert!(plan.has_data_type("rainfall"));
    }

    #[test]
    fn nulls_and_scalars_are_tolerated() {
        let plan: QueryPlan = serde_json::from_value(json!({
            "states": null,
            "crops": "Wheat",
            "data_types": ["climate data", null, ""],
            "analysis_type": null,
            "time_period": {"start_year": "2020", "end_year": null}
        }))
        .unwrap();

        assert!(plan.states.is_empty());
        assert_eq!(plan.crops, vec!["Wheat"]);
        assert_eq!(plan.data_types, vec!["climate data"]);
        assert_eq!(plan.analysis_type, AnalysisType::General);
        assert_eq!(
            plan.time_period,
            Some(TimePeriod {
                start_year: Some(2020),
                end_year: None
            })
        );
    }

    #[test]
    fn open_bounds_use_sentinels() {
        let period = TimePeriod {
            start_year: None,
            end_year: Some(2022),
        };
        assert_eq!(period.bounds(), (MIN_YEAR, 2022));
        assert_eq!(TimePeriod::default().bounds(), (MIN_YEAR, MAX_YEAR));
    }

    #[test]
    fn fallback_plan_shape() {
        let plan = QueryPlan::fallback();
        assert!(plan.states.is_empty());
        assert!(plan.crops.is_empty());
        assert_eq!(plan.time_period, Some(TimePeriod::new(2019, 2024)));
        assert_eq!(plan.data_types, vec!["production"]);
        assert_eq!(plan.analysis_type, AnalysisType::General);
    }

    #[test]
    fn plan_serializes_analysis_type_as_string() {
        let value = serde_json::to_value(QueryPlan::fallback()).unwrap();
        assert_eq!(value["analysis_type"], "general");
        assert_eq!(value["time_period"]["start_year"], 2019);
    }

    #[test]
    fn data_type_mentions_is_substring_match() {
        let plan = QueryPlan {
            data_types: vec!["climate_patterns".to_string()],
            ..QueryPlan::default()
        };
        assert!(plan.data_type_mentions("climate"));
        assert!(!plan.has_data_type("climate"));
    }
}
