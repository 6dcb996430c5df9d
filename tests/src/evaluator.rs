use async_trait::async_trait;
use flock_kernel::agent::{AgentError, AgentOutputs, AgentResult, EvaluationRequest, Evaluator};
use flock_kernel::resolver::TypeHint;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A mock evaluator standing in for the LLM library.
///
/// Answers with predefined outputs per agent name. Agents without a
/// predefined answer get a placeholder value for every declared output
/// field, shaped after its type hint. Every request is recorded.
#[derive(Clone, Default)]
pub struct MockEvaluator {
    responses: Arc<RwLock<HashMap<String, AgentOutputs>>>,
    failures: Arc<RwLock<HashMap<String, AgentError>>>,
    requests: Arc<RwLock<Vec<EvaluationRequest>>>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests from `agent` with `outputs`.
    pub fn add_response(&self, agent: &str, outputs: Value) {
        let outputs = match outputs {
            Value::Object(map) => map.into_iter().collect(),
            _ => AgentOutputs::new(),
        };
        if let Ok(mut responses) = self.responses.write() {
            responses.insert(agent.to_string(), outputs);
        }
    }

    /// Fail every request from `agent` with `error`.
    pub fn fail_agent(&self, agent: &str, error: AgentError) {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert(agent.to_string(), error);
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<EvaluationRequest> {
        self.requests
            .read()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Requests received for one agent.
    pub fn requests_for(&self, agent: &str) -> Vec<EvaluationRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.agent_name == agent)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }
}

fn placeholder(field: &str, hint: &TypeHint) -> Value {
    match hint {
        TypeHint::Int => json!(0),
        TypeHint::Float => json!(0.0),
        TypeHint::Bool => json!(false),
        TypeHint::List(_) => json!([]),
        TypeHint::Dict(_, _) => json!({}),
        TypeHint::Optional(_) => Value::Null,
        TypeHint::Literal(options) => options
            .first()
            .map(|o| Value::String(o.clone()))
            .unwrap_or(Value::Null),
        _ => Value::String(format!("mock {field}")),
    }
}

#[async_trait]
impl Evaluator for MockEvaluator {
    async fn evaluate(&self, request: EvaluationRequest) -> AgentResult<AgentOutputs> {
        let agent = request.agent_name.clone();
        let fallback: AgentOutputs = request
            .output_fields
            .iter()
            .map(|field| (field.name.clone(), placeholder(&field.name, &field.type_hint)))
            .collect();

        if let Ok(mut requests) = self.requests.write() {
            requests.push(request);
        }

        if let Some(error) = self.failures.read().ok().and_then(|f| f.get(&agent).cloned()) {
            return Err(error);
        }

        let predefined = self
            .responses
            .read()
            .ok()
            .and_then(|responses| responses.get(&agent).cloned());
        Ok(predefined.unwrap_or(fallback))
    }
}
