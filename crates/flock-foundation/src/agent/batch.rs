//! 批处理 Agent
//! Batch agent
//!
//! Splits the list under `iter_input` into chunks of `batch_size`, evaluates
//! the wrapped agent on every chunk concurrently and reduces the results
//! positionally: each output key maps to the list of per-batch values, and
//! `batch_results` holds the raw per-batch outputs. One failing batch fails
//! the whole run.

use async_trait::async_trait;
use flock_kernel::agent::{
    Agent, AgentError, AgentInputs, AgentOutputs, AgentResult, AgentSpec, CallableEntry,
};
use flock_kernel::resolver::top_level_to_keys;
use futures::future::try_join_all;
use serde_json::{Value, json};
use tracing::debug;

pub struct BatchAgent<A> {
    inner: A,
    iter_input: String,
    batch_size: usize,
}

impl<A: Agent> BatchAgent<A> {
    pub const TYPE_NAME: &'static str = "BatchAgent";

    /// `batch_size` is clamped to at least 1.
    pub fn new(inner: A, iter_input: impl Into<String>, batch_size: usize) -> Self {
        Self {
            inner,
            iter_input: iter_input.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn iter_input(&self) -> &str {
        &self.iter_input
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn partitions(&self, inputs: &AgentInputs) -> AgentResult<Vec<AgentInputs>> {
        let items = inputs
            .get(&self.iter_input)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AgentError::InvalidInput(format!(
                    "Expected a list for key '{}'",
                    self.iter_input
                ))
            })?;

        Ok(items
            .chunks(self.batch_size)
            .map(|chunk| {
                let mut batch = inputs.clone();
                batch.insert(self.iter_input.clone(), Value::Array(chunk.to_vec()));
                batch
            })
            .collect())
    }
}

#[async_trait]
impl<A: Agent> Agent for BatchAgent<A> {
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
        let batches = self.partitions(inputs)?;
        debug!(
            agent = %self.name(),
            batches = batches.len(),
            batch_size = self.batch_size,
            "Evaluating batches"
        );

        let results = try_join_all(batches.iter().map(|batch| self.inner.evaluate(batch))).await?;

        let output_spec = self.spec().output.as_static().unwrap_or_default();
        let mut aggregated = AgentOutputs::new();
        for key in top_level_to_keys(output_spec) {
            let column: Vec<Value> = results
                .iter()
                .map(|r| r.get(&key).cloned().unwrap_or(Value::Null))
                .collect();
            aggregated.insert(key, Value::Array(column));
        }

        let batch_results: Vec<Value> = results
            .into_iter()
            .map(|r| Value::Object(r.into_iter().collect()))
            .collect();
        aggregated.insert("batch_results".to_string(), Value::Array(batch_results));
        Ok(aggregated)
    }

    fn to_dict(&self) -> Value {
        let mut data = self.inner.to_dict();
        if let Some(obj) = data.as_object_mut() {
            obj.insert("iter_input".into(), json!(self.iter_input));
            obj.insert("batch_size".into(), json!(self.batch_size));
        }
        data
    }

    fn callable_entries(&self) -> Vec<CallableEntry> {
        self.inner.callable_entries()
    }
}
