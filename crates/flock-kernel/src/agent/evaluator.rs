//! 求值器接口
//! Evaluator interface
//!
//! The evaluator is the seam to the LLM library: it receives the parsed field
//! signatures and resolved inputs of one agent run and returns the outputs.

use super::error::AgentResult;
use super::tool::SharedTool;
use super::types::{AgentInputs, AgentOutputs, AgentType};
use crate::resolver::FieldSpec;
use async_trait::async_trait;

/// 一次求值请求
/// A single evaluation request
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub agent_name: String,
    pub model: String,
    /// `"<inputs> -> <outputs>"` with field descriptions stripped
    pub signature: String,
    pub description: String,
    pub input_fields: Vec<FieldSpec>,
    pub output_fields: Vec<FieldSpec>,
    pub inputs: AgentInputs,
    pub tools: Vec<SharedTool>,
    pub agent_type: AgentType,
    pub use_cache: bool,
}

impl EvaluationRequest {
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.output_fields.iter().map(|f| f.name.as_str())
    }

    pub fn tool(&self, name: &str) -> Option<&SharedTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// 与声明类型不符的非空输入
    /// Declared input fields whose non-null value does not fit the type hint
    pub fn mismatched_inputs(&self) -> impl Iterator<Item = &FieldSpec> {
        self.input_fields.iter().filter(|field| {
            self.inputs
                .get(&field.name)
                .is_some_and(|value| !value.is_null() && !field.type_hint.accepts(value))
        })
    }
}

/// 求值器 Trait
/// Evaluator trait
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: EvaluationRequest) -> AgentResult<AgentOutputs>;
}
