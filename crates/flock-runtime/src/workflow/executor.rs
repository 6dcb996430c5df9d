//! 链执行器
//! Chain executors: in-process and through the workflow boundary

use super::activity::{ActivityError, ActivityOutcome, ActivityRunner};
use crate::engine::ExecutionEngine;
use crate::error::FlockResult;
use crate::retry::{RetryConfig, retry_with_policy};
use async_trait::async_trait;
use chrono::Local;
use flock_kernel::agent::AgentOutputs;
use flock_kernel::config::WorkflowConfig;
use flock_kernel::context::{FLOCK_RESULT, FlockContext};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, info_span};

/// 工作流时间戳格式
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 链执行器
/// Executes a seeded context's chain
#[async_trait]
pub trait ChainExecutor: Send + Sync {
    async fn execute(&self, context: &mut FlockContext) -> FlockResult<AgentOutputs>;
}

// ============================================================================
// 本地执行
// ============================================================================

/// 本地执行器，直接在活动上下文上运行
/// Runs the engine directly on the live context
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    engine: ExecutionEngine,
}

impl LocalExecutor {
    pub fn new(engine: ExecutionEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ChainExecutor for LocalExecutor {
    async fn execute(&self, context: &mut FlockContext) -> FlockResult<AgentOutputs> {
        info!(run_id = %context.run_id(), "Running chain locally");
        Ok(self.engine.run_chain(context).await?)
    }
}

// ============================================================================
// 工作流执行
// ============================================================================

/// 工作流执行器
/// Workflow executor
///
/// Serializes the context and runs the chain through an [`ActivityRunner`]
/// under a start-to-close timeout and the configured retry policy. The
/// outcome is written to `flock.result` as `{"result": .., "success": bool}`.
pub struct WorkflowExecutor {
    runner: Arc<dyn ActivityRunner>,
    config: WorkflowConfig,
}

impl WorkflowExecutor {
    pub fn new(runner: Arc<dyn ActivityRunner>, config: WorkflowConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    async fn run_workflow(
        &self,
        context: &mut FlockContext,
        workflow_id: &str,
    ) -> FlockResult<AgentOutputs> {
        info!(timestamp = %context.workflow_timestamp(), "Starting workflow execution");
        let payload = context.to_dict()?;

        let outcome = self
            .run_activity(workflow_id, payload)
            .await
            .and_then(decode_output);

        match outcome {
            Ok(outputs) => {
                context.set_variable(
                    FLOCK_RESULT,
                    json!({
                        "result": Value::Object(outputs.clone().into_iter().collect()),
                        "success": true,
                    }),
                );
                info!("Workflow completed successfully");
                Ok(outputs)
            }
            Err(e) => {
                error!(error = %e, "Workflow execution failed");
                context.set_variable(
                    FLOCK_RESULT,
                    json!({
                        "result": format!("Failed: {e}"),
                        "success": false,
                    }),
                );
                Err(e.into())
            }
        }
    }

    async fn run_activity(&self, activity_id: &str, payload: Value) -> Result<Value, ActivityError> {
        let timeout_ms = self.config.start_to_close_timeout_ms;
        let retry = RetryConfig::from(&self.config.retry);
        let runner = &self.runner;

        retry_with_policy(&retry, ActivityError::is_retryable, || {
            let payload = payload.clone();
            async move {
                match tokio::time::timeout(
                    Duration::from_millis(timeout_ms),
                    runner.run_activity(activity_id, payload),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ActivityError::Timeout { timeout_ms }),
                }
            }
        })
        .await
    }
}

/// 解码活动结果
/// Decode an activity result into chain output
fn decode_output(value: Value) -> Result<AgentOutputs, ActivityError> {
    ActivityOutcome::from_value(value)?.into_outputs()
}

#[async_trait]
impl ChainExecutor for WorkflowExecutor {
    async fn execute(&self, context: &mut FlockContext) -> FlockResult<AgentOutputs> {
        let workflow_id = context.run_id().to_string();
        context.set_workflow_id(workflow_id.clone());
        context.set_workflow_timestamp(Local::now().format(TIMESTAMP_FORMAT).to_string());

        let span = info_span!(
            "workflow.execute",
            workflow_id = %workflow_id,
            task_queue = %self.config.task_queue,
        );

        self.run_workflow(context, &workflow_id)
            .instrument(span)
            .await
    }
}
