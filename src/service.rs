use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::answerer::{AnswerGenerator, Citation};
use crate::config::Config;
use crate::datasets::{DatasetListing, DatasetRegistry};
use crate::llm::{LlmClient, client_from_config};
use crate::plan::{QueryPlan, QuestionAnalyzer};
use crate::retrieval::{DataFetchOrchestrator, DatasetFetcher, DatasetSource};

/// Errors a caller can fix by changing the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Question cannot be empty")]
    EmptyQuestion,
}

/// Everything returned for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub query_plan: QueryPlan,
}

/// Question answering over the registered datasets.
///
/// `QueryService` composes the three pipeline stages: question analysis,
/// dataset retrieval and answer generation. It is shared by the CLI and the
/// HTTP server and holds no per-request state, so one instance can serve
/// concurrent requests.
pub struct QueryService {
    analyzer: QuestionAnalyzer,
    orchestrator: DataFetchOrchestrator,
    answerer: AnswerGenerator,
}

impl QueryService {
    pub fn new(
        analyzer: QuestionAnalyzer,
        orchestrator: DataFetchOrchestrator,
        answerer: AnswerGenerator,
    ) -> Self {
        Self {
            analyzer,
            orchestrator,
            answerer,
        }
    }

    /// Wires one LLM client into both LLM stages and uses `source` for data.
    pub fn with_components(
        client: Arc<dyn LlmClient>,
        model: &str,
        registry: DatasetRegistry,
        source: Arc<dyn DatasetSource>,
    ) -> Self {
        Self::new(
            QuestionAnalyzer::new(client.clone(), model),
            DataFetchOrchestrator::new(registry, source),
            AnswerGenerator::new(client, model),
        )
    }

    /// Builds the production service: the configured LLM backend,
    /// data.gov.in as the remote source and the on-disk cache.
    ///
    /// # Errors
    ///
    /// Fails if the LLM client or the HTTP client for dataset retrieval
    /// cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = client_from_config(config).context("Failed to create LLM client")?;
        let fetcher =
            DatasetFetcher::from_config(config).context("Failed to create dataset fetcher")?;
        let registry = fetcher.registry().clone();

        Ok(Self::with_components(
            client,
            config.llm_model(),
            registry,
            Arc::new(fetcher),
        ))
    }

    /// Answers `question`.
    ///
    /// Analysis, retrieval and generation failures all degrade inside the
    /// pipeline, so the only error is a blank question.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::EmptyQuestion` if `question` is empty or
    /// whitespace-only.
    pub fn ask(&self, question: &str) -> Result<QueryResponse, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        info!(question, "processing question");

        let plan = self.analyzer.analyze(question);
        info!(?plan, "query plan");

        let data = self.orchestrator.fetch_all(&plan);
        info!(datasets = data.len(), "datasets fetched");

        let (answer, citations) = self.answerer.answer(question, &plan, &data).into_parts();

        Ok(QueryResponse {
            answer,
            citations,
            query_plan: plan,
        })
    }

    /// Lists every registered dataset.
    pub fn datasets(&self) -> Vec<DatasetListing> {
        self.orchestrator.registry().list_available_datasets()
    }
}

#[cfg(test)]
mod tests;
