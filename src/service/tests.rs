use super::*;
use crate::datasets::{DatasetKey, DatasetPayload, FetchError, fixture};
use crate::llm::LlmError;
use crate::plan::AnalysisType;
use crate::retrieval::{FetchOutcome, filter_payload};
use std::sync::Mutex;

/// Answers analysis prompts with `plan_json` and answer prompts with `answer`.
struct ScriptedClient {
    plan_json: String,
    answer: Result<String, u16>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(plan_json: &str, answer: Result<&str, u16>) -> Arc<Self> {
        Arc::new(Self {
            plan_json: plan_json.to_string(),
            answer: answer.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

impl LlmClient for ScriptedClient {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("Extract and return ONLY a JSON object") {
            Ok(self.plan_json.clone())
        } else {
            self.answer.clone().map_err(|status| LlmError::Http { status })
        }
    }
}

struct FixtureSource;

impl DatasetSource for FixtureSource {
    fn fetch(&self, key: DatasetKey, plan: &QueryPlan) -> Result<FetchOutcome, FetchError> {
        let payload = fixture(key).map_or(DatasetPayload::Empty, DatasetPayload::from);
        Ok(FetchOutcome::Degraded {
            payload: filter_payload(payload, plan),
            reason: FetchError::Source("offline".to_string()),
        })
    }
}

fn service(client: Arc<ScriptedClient>) -> QueryService {
    QueryService::with_components(
        client,
        "test-model",
        DatasetRegistry::builtin(),
        Arc::new(FixtureSource),
    )
}

#[test]
fn ask_rejects_blank_question() {
    let client = ScriptedClient::new("{}", Ok("unused"));
    let service = service(client.clone());

    assert_eq!(service.ask("").unwrap_err(), QueryError::EmptyQuestion);
    assert_eq!(service.ask("  \n\t").unwrap_err(), QueryError::EmptyQuestion);
    assert!(client.prompts.lock().unwrap().is_empty(), "no LLM call for blank input");
}

#[test]
fn ask_runs_full_pipeline() {
    let client = ScriptedClient::new(
        r#"{"states": ["Punjab"], "data_types": ["rainfall"], "analysis_type": "trend"}"#,
        Ok("Punjab averaged 620 mm."),
    );
    let response = service(client.clone())
        .ask("How has rainfall in Punjab changed?")
        .unwrap();

    assert_eq!(response.answer, "Punjab averaged 620 mm.");
    assert_eq!(response.query_plan.states, vec!["Punjab"]);
    assert_eq!(response.query_plan.analysis_type, AnalysisType::Trend);

    let datasets: Vec<_> = response.citations.iter().map(|c| c.dataset.as_str()).collect();
    assert_eq!(
        datasets,
        vec!["IMD District-wise Rainfall Data", "State-wise Agricultural Statistics"]
    );
    assert_eq!(response.citations[0].records, 3);
    assert_eq!(response.citations[1].records, 0);

    assert_eq!(client.prompts.lock().unwrap().len(), 2);
}

#[test]
fn ask_uses_fallback_plan_when_analysis_fails() {
    let client = ScriptedClient::new("not json at all", Ok("answer"));
    let response = service(client).ask("gibberish").unwrap();

    assert_eq!(response.query_plan, QueryPlan::fallback());
    assert_eq!(response.citations.len(), 2);
    assert_eq!(response.citations[0].dataset, "District-wise Crop Production Statistics");
}

#[test]
fn ask_degrades_when_answer_generation_fails() {
    let client = ScriptedClient::new("{}", Err(503));
    let response = service(client).ask("anything").unwrap();

    assert!(response.answer.starts_with(
        "I found relevant data but encountered an error generating the answer:"
    ));
    assert!(response.citations.is_empty());
}

#[test]
fn response_serializes_with_expected_keys() {
    let client = ScriptedClient::new("{}", Ok("ok"));
    let response = service(client).ask("q").unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["answer"], "ok");
    assert!(json["citations"].is_array());
    assert!(json["query_plan"].is_object());
    assert_eq!(json["query_plan"]["analysis_type"], "general");
}

#[test]
fn datasets_lists_registry() {
    let service = service(ScriptedClient::new("{}", Ok("ok")));
    let keys: Vec<_> = service.datasets().into_iter().map(|d| d.key).collect();
    assert_eq!(keys, DatasetKey::ALL.to_vec());
}
