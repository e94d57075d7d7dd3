//! Query plans: the structured form of a user's question.

mod analyzer;
mod types;

pub use analyzer::{QuestionAnalyzer, QuestionAnalyzerBuilder};
pub use types::{AnalysisType, MAX_YEAR, MIN_YEAR, QueryPlan, TimePeriod};
