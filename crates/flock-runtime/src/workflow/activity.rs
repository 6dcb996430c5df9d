//! 活动定义
//! Activity body and runners

use crate::engine::{ChainError, ChainErrorKind, ChainOptions, ExecutionEngine};
use crate::registry::AgentRegistry;
use async_trait::async_trait;
use flock_kernel::agent::AgentOutputs;
use flock_kernel::context::{ContextError, FlockContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};

/// 活动错误
/// Activity error
#[derive(Debug, Clone, Error)]
pub enum ActivityError {
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Activity timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Activity runner unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid activity result: {0}")]
    InvalidResult(String),
}

impl ActivityError {
    /// 是否可重试
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ActivityError::Timeout { .. } | ActivityError::Unavailable(_) => true,
            ActivityError::Chain(ChainError::Execution { source, .. }) => source.is_retryable(),
            _ => false,
        }
    }
}

// ============================================================================
// 活动结果
// ============================================================================

/// 活动结果信封
/// Activity result envelope
///
/// Encoded as `{"status": "ok", "result": {..}}` or
/// `{"status": "error", "error": "<message>", "kind": "<kind>"}`. Agent
/// output keys never collide with the envelope fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ActivityOutcome {
    #[serde(rename = "ok")]
    Completed { result: AgentOutputs },
    #[serde(rename = "error")]
    Failed { error: String, kind: ChainErrorKind },
}

impl ActivityOutcome {
    pub fn failed(error: &ChainError) -> Self {
        ActivityOutcome::Failed {
            error: error.to_string(),
            kind: error.kind(),
        }
    }

    pub fn to_value(&self) -> Result<Value, ActivityError> {
        serde_json::to_value(self).map_err(|e| ActivityError::InvalidResult(e.to_string()))
    }

    /// 解码活动结果，非信封值视为无效
    /// Decode an activity result. Anything but an envelope is invalid.
    pub fn from_value(value: Value) -> Result<Self, ActivityError> {
        serde_json::from_value(value)
            .map_err(|e| ActivityError::InvalidResult(format!("expected a status envelope: {e}")))
    }

    /// 转为链输出，错误结果还原为 [`ChainError::Reported`]
    pub fn into_outputs(self) -> Result<AgentOutputs, ActivityError> {
        match self {
            ActivityOutcome::Completed { result } => Ok(result),
            ActivityOutcome::Failed { error, kind } => Err(ChainError::Reported {
                kind,
                message: error,
            }
            .into()),
        }
    }
}

/// 活动主体：反序列化上下文并执行代理链
/// Activity body: deserialize the context and run the chain.
///
/// Start-lookup and execution failures are raised. Every other chain failure
/// is returned as a `{"status": "error", ..}` envelope.
pub async fn run_agent_activity(
    registry: Arc<AgentRegistry>,
    context: Value,
    options: &ChainOptions,
) -> Result<Value, ActivityError> {
    let mut context = FlockContext::from_dict(&context)?;
    let span = info_span!("run_agent", run_id = %context.run_id());

    async move {
        let engine = ExecutionEngine::new(registry).with_options(options.clone());
        let outcome = match engine.run_chain(&mut context).await {
            Ok(result) => {
                info!("Agent chain completed");
                ActivityOutcome::Completed { result }
            }
            Err(e) if e.is_reported() => {
                warn!(error = %e, "Agent chain stopped");
                ActivityOutcome::failed(&e)
            }
            Err(e) => return Err(ActivityError::from(e)),
        };
        outcome.to_value()
    }
    .instrument(span)
    .await
}

/// 活动执行器
/// Runs an activity on behalf of the workflow executor
#[async_trait]
pub trait ActivityRunner: Send + Sync {
    async fn run_activity(&self, activity_id: &str, context: Value) -> Result<Value, ActivityError>;
}

/// 进程内活动执行器
/// In-process runner that calls [`run_agent_activity`] directly
#[derive(Debug, Clone)]
pub struct LocalActivityRunner {
    registry: Arc<AgentRegistry>,
    options: ChainOptions,
}

impl LocalActivityRunner {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            options: ChainOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChainOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl ActivityRunner for LocalActivityRunner {
    async fn run_activity(&self, activity_id: &str, context: Value) -> Result<Value, ActivityError> {
        info!(activity_id, "Running activity in-process");
        run_agent_activity(self.registry.clone(), context, &self.options).await
    }
}
