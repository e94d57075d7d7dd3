pub mod answerer;
pub mod config;
pub mod datasets;
pub mod llm;
pub mod plan;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod telemetry;
pub mod utils;

pub use answerer::{Answer, AnswerGenerator, AnswerGeneratorBuilder, Citation};
pub use config::{Config, ConfigError, LlmProvider};
pub use datasets::{
    DatasetCache, DatasetDescriptor, DatasetKey, DatasetPayload, DatasetRegistry, FetchError,
    Table,
};
pub use llm::{LlmClient, LlmError};
pub use plan::{AnalysisType, QueryPlan, QuestionAnalyzer, QuestionAnalyzerBuilder, TimePeriod};
pub use retrieval::{
    AggregatedResult, DataFetchOrchestrator, DatasetFetcher, DatasetSource, FetchOutcome,
    select_datasets, summarize,
};
pub use service::{QueryError, QueryResponse, QueryService};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_types_accessible_from_crate_root() {
        let plan = QueryPlan::fallback();
        assert_eq!(plan.analysis_type, AnalysisType::General);
        assert!(select_datasets(&plan).contains(&DatasetKey::CropProduction));

        let registry = DatasetRegistry::builtin();
        assert_eq!(registry.list_available_datasets().len(), 3);

        assert_eq!(summarize(&AggregatedResult::new()), "");
    }
}
