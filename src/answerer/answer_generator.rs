//! Answer generation from filtered datasets using LLMs.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::{LlmClient, LlmError};
use crate::plan::QueryPlan;
use crate::retrieval::{AggregatedResult, summarize};

use super::types::{Answer, Citation};

/// Prompt template for writing the final answer.
const PROMPT_TEMPLATE: &str = r#"You are an expert data analyst for Indian agriculture and climate data.

USER QUESTION: {question}

QUERY PLAN: {query_plan}

AVAILABLE DATA:
{data_summary}

TASK: Provide a comprehensive, accurate answer to the question using the data provided.

REQUIREMENTS:
1. Use specific numbers and statistics from the data
2. Structure your answer clearly with comparisons if needed
3. Mention which dataset each piece of information comes from
4. If data is insufficient, say so clearly
5. Keep the tone professional but accessible
6. Include year ranges when discussing trends

Provide your answer now:"#;

/// Builder for constructing `AnswerGenerator` instances.
#[derive(Default)]
pub struct AnswerGeneratorBuilder {
    client: Option<Arc<dyn LlmClient>>,
    model: Option<String>,
}

impl AnswerGeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the language model client to use.
    pub fn client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `AnswerGenerator`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called.
    #[must_use]
    pub fn build(self) -> AnswerGenerator {
        AnswerGenerator {
            client: self.client.expect("client must be set via client() method"),
            model: self.model.unwrap_or_default(),
        }
    }
}

/// Writes cited answers from a question, its plan and the fetched data.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl AnswerGenerator {
    #[must_use]
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Generates an answer. LLM failures become an apology with no citations.
    pub fn answer(&self, question: &str, plan: &QueryPlan, result: &AggregatedResult) -> Answer {
        match self.try_answer(question, plan, result) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "answer generation failed");
                Answer::generation_failed(e)
            }
        }
    }

    /// Generates an answer, surfacing LLM failures.
    ///
    /// # Errors
    ///
    /// Returns the client's error, or `LlmError::Serialization` if the plan
    /// cannot be rendered as JSON.
    pub fn try_answer(
        &self,
        question: &str,
        plan: &QueryPlan,
        result: &AggregatedResult,
    ) -> Result<Answer, LlmError> {
        let prompt = build_prompt(question, plan, result)?;
        debug!(prompt_chars = prompt.chars().count(), "generating answer");

        let text = self.client.generate(&self.model, &prompt)?;
        Ok(Answer::new(text, Citation::from_result(result)))
    }
}

fn build_prompt(
    question: &str,
    plan: &QueryPlan,
    result: &AggregatedResult,
) -> Result<String, LlmError> {
    let query_plan = serde_json::to_string_pretty(plan).map_err(LlmError::Serialization)?;
    let data_summary = summarize(result);
    Ok(fill_template(
        PROMPT_TEMPLATE,
        &[
            ("{question}", question),
            ("{query_plan}", &query_plan),
            ("{data_summary}", &data_summary),
        ],
    ))
}

/// Substitutes placeholders in one pass; inserted values are never rescanned.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
