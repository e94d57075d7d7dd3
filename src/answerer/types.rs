//! Types for generated answers.

use serde::Serialize;

use crate::retrieval::AggregatedResult;

/// A dataset the answer drew on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// Human-readable dataset description
    pub dataset: String,
    /// Where the dataset was retrieved from
    pub url: String,
    /// Number of records that survived filtering
    pub records: usize,
}

impl Citation {
    /// One citation per dataset in `result`, in result order.
    pub fn from_result(result: &AggregatedResult) -> Vec<Self> {
        result
            .entries()
            .iter()
            .map(|entry| Self {
                dataset: entry.description.clone(),
                url: entry.locator.clone(),
                records: entry.payload.len(),
            })
            .collect()
    }
}

/// Answer text plus the datasets it cites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    text: String,
    citations: Vec<Citation>,
}

impl Answer {
    pub fn new(text: String, citations: Vec<Citation>) -> Self {
        Self { text, citations }
    }

    /// Answer used when the LLM call failed. Carries no citations.
    pub fn generation_failed(error: impl std::fmt::Display) -> Self {
        Self {
            text: format!(
                "I found relevant data but encountered an error generating the answer: {error}"
            ),
            citations: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn into_parts(self) -> (String, Vec<Citation>) {
        (self.text, self.citations)
    }
}
