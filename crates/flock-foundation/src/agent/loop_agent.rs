//! 循环 Agent
//! Loop agent
//!
//! Evaluates the wrapped agent repeatedly, feeding each iteration's outputs
//! back in as inputs, until the agent's termination condition holds or
//! `max_iterations` evaluations have run.

use async_trait::async_trait;
use flock_kernel::agent::{
    Agent, AgentInputs, AgentOutputs, AgentResult, AgentSpec, CallableEntry,
};
use serde_json::{Value, json};
use tracing::{Instrument, debug, info_span};

/// 默认最大迭代次数
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

pub struct LoopAgent<A> {
    inner: A,
    max_iterations: usize,
}

impl<A: Agent> LoopAgent<A> {
    pub const TYPE_NAME: &'static str = "LoopAgent";

    pub fn new(inner: A) -> Self {
        Self {
            inner,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Clamped to at least one iteration.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: Agent> Agent for LoopAgent<A> {
    fn spec(&self) -> &AgentSpec {
        self.inner.spec()
    }

    fn spec_mut(&mut self) -> &mut AgentSpec {
        self.inner.spec_mut()
    }

    fn agent_type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    async fn evaluate(&self, inputs: &AgentInputs) -> AgentResult<AgentOutputs> {
        let mut current = inputs.clone();
        let mut results: Vec<Value> = Vec::new();

        for iteration in 0..self.max_iterations {
            let span = info_span!("loop.iteration", agent = %self.name(), iteration);
            let output = self.inner.evaluate(&current).instrument(span).await?;
            let done = self.spec().termination.is_met(&output);

            results.push(Value::Object(
                output.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ));
            current.extend(output);

            if done {
                debug!(agent = %self.name(), iteration, "Termination condition met");
                break;
            }
        }

        let mut out = AgentOutputs::new();
        out.insert("iterations".into(), json!(results.len()));
        out.insert(
            "final_result".into(),
            results.last().cloned().unwrap_or(Value::Null),
        );
        out.insert("results".into(), Value::Array(results));
        Ok(out)
    }

    fn to_dict(&self) -> Value {
        let mut data = self.inner.to_dict();
        if let Some(obj) = data.as_object_mut() {
            obj.insert("max_iterations".into(), json!(self.max_iterations));
        }
        data
    }

    fn callable_entries(&self) -> Vec<CallableEntry> {
        self.inner.callable_entries()
    }
}
