//! 声明式 Agent
//! Declarative agent
//!
//! The default agent: builds an [`EvaluationRequest`] from its field
//! signatures, hands it to the [`Evaluator`], and echoes every input the
//! evaluator did not overwrite into the outputs.

use async_trait::async_trait;
use flock_kernel::agent::{
    Agent, AgentError, AgentInputs, AgentOutputs, AgentResult, AgentSpec, CallableTable,
    EvaluationRequest, Evaluator, SpecValue,
};
use flock_kernel::resolver::{clean_signature, parse_fields};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 默认的 LLM 驱动 Agent
/// Default LLM-backed agent
pub struct DeclarativeAgent {
    spec: AgentSpec,
    evaluator: Arc<dyn Evaluator>,
}

impl DeclarativeAgent {
    pub const TYPE_NAME: &'static str = "DeclarativeAgent";

    pub fn new(spec: AgentSpec, evaluator: Arc<dyn Evaluator>) -> Self {
        Self { spec, evaluator }
    }

    /// 从序列化数据恢复
    /// Restore from serialized definition data
    pub fn from_dict(
        data: &serde_json::Value,
        table: &CallableTable,
        evaluator: Arc<dyn Evaluator>,
    ) -> AgentResult<Self> {
        Ok(Self::new(AgentSpec::from_dict(data, table)?, evaluator))
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    /// 构建求值请求
    /// Build the evaluation request for `inputs`
    pub fn evaluation_request(&self, inputs: &AgentInputs) -> AgentResult<EvaluationRequest> {
        let spec = &self.spec;
        let input = static_field(&spec.name, "input", &spec.input)?;
        let output = static_field(&spec.name, "output", &spec.output)?;
        Ok(EvaluationRequest {
            agent_name: spec.name.clone(),
            model: spec.model_or_default().to_string(),
            signature: format!("{} -> {}", clean_signature(input), clean_signature(output)),
            description: static_field(&spec.name, "description", &spec.description)?.to_string(),
            input_fields: parse_fields(input)?,
            output_fields: parse_fields(output)?,
            inputs: inputs.clone(),
            tools: spec.tools.clone(),
            agent_type: spec.agent_type(),
            use_cache: spec.use_cache,
        })
    }
}

fn static_field<'a>(agent: &str, field: &str, value: &'a SpecValue) -> AgentResult<&'a str> {
    value.as_static().ok_or_else(|| {
        AgentError::InvalidInput(format!(
            "Agent '{agent}' has an unresolved dynamic {field}"
        ))
    })
}

/// 将未被覆盖的输入回显到输出中
/// Copy every input key missing from `outputs` into it
pub fn echo_inputs(mut outputs: AgentOutputs, inputs: &AgentInputs) -> AgentOutputs {
    for (key, value) in inputs {
        outputs.entry(key.clone()).or_insert_with(|| value.clone());
    }
    outputs
}

#[async_trait]
impl Agent for DeclarativeAgent {
    fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut AgentSpec {
        &mut self.spec
    }

    fn agent_type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    async fn evaluate(&self, inputs: &AgentInputs) -> AgentResult<AgentOutputs> {
        let request = self.evaluation_request(inputs)?;
        for field in request.mismatched_inputs() {
            warn!(
                agent = %self.spec.name,
                field = %field.name,
                expected = %field.type_hint,
                "Input does not match declared type"
            );
        }
        debug!(
            agent = %self.spec.name,
            agent_type = %request.agent_type,
            model = %request.model,
            "Evaluating"
        );

        match self.evaluator.evaluate(request).await {
            Ok(outputs) => {
                info!(agent = %self.spec.name, "Evaluation successful");
                Ok(echo_inputs(outputs, inputs))
            }
            Err(e) => {
                error!(agent = %self.spec.name, error = %e, "Error during evaluation");
                Err(e)
            }
        }
    }
}
