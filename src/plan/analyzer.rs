//! Turns a free-text question into a `QueryPlan` using an LLM.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::{LlmClient, LlmError, extract_json};

use super::types::QueryPlan;

/// Prompt template for question analysis.
const PROMPT_TEMPLATE: &str = r#"You are a data analyst assistant for Indian government data.
Analyze this question and extract information in JSON format:

Question: {question}

Extract and return ONLY a JSON object with these fields:
{
    "states": ["state1", "state2"],
    "districts": ["district1"],
    "crops": ["crop1", "crop2"],
    "crop_types": ["cereals", "pulses"],
    "time_period": {"start_year": 2018, "end_year": 2023},
    "data_types": ["production", "rainfall"],
    "analysis_type": "comparison",
    "key_metrics": ["top_n_crops", "average_rainfall"]
}

Rules:
- Use full state names (e.g., "Maharashtra", "Punjab")
- Extract years mentioned or use last 5 years as default
- data_types may include: production, rainfall, climate, area, yield
- Analysis type can be: comparison, trend, correlation, recommendation, general
- Return ONLY valid JSON, no additional text
"#;

/// Builder for constructing `QuestionAnalyzer` instances.
#[derive(Default)]
pub struct QuestionAnalyzerBuilder {
    client: Option<Arc<dyn LlmClient>>,
    model: Option<String>,
}

impl QuestionAnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the language model client to use.
    pub fn client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the model name passed to the client.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `QuestionAnalyzer`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called.
    #[must_use]
    pub fn build(self) -> QuestionAnalyzer {
        QuestionAnalyzer {
            client: self.client.expect("client must be set via client() method"),
            model: self.model.unwrap_or_default(),
        }
    }
}

/// Extracts structured retrieval intent from natural-language questions.
pub struct QuestionAnalyzer {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl QuestionAnalyzer {
    #[must_use]
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Analyzes `question`, substituting `QueryPlan::fallback()` on any failure.
    pub fn analyze(&self, question: &str) -> QueryPlan {
        match self.try_analyze(question) {
            Ok(plan) => {
                debug!(?plan, "question analyzed");
                plan
            }
            Err(e) => {
                warn!(error = %e, "question analysis failed, using fallback plan");
                QueryPlan::fallback()
            }
        }
    }

    /// Analyzes `question`, surfacing LLM and parse failures.
    ///
    /// # Errors
    ///
    /// Returns the client's error, or `LlmError::Api` when the response holds
    /// no JSON object, or `LlmError::Serialization` when it is not a plan.
    pub fn try_analyze(&self, question: &str) -> Result<QueryPlan, LlmError> {
        let prompt = PROMPT_TEMPLATE.replace("{question}", question);
        let response = self.client.generate(&self.model, &prompt)?;
        parse_plan(&response)
    }
}

fn parse_plan(response: &str) -> Result<QueryPlan, LlmError> {
    let json = extract_json(response).ok_or_else(|| LlmError::Api {
        message: "Failed to extract JSON from LLM response".to_string(),
    })?;
    serde_json::from_str(json).map_err(LlmError::Serialization)
}
