//! 执行引擎
//! Chain execution engine
//!
//! Drives one agent chain: resolve inputs, run the agent, record the result,
//! determine the hand-off, advance. Agents run strictly one after another.

use crate::registry::{AgentRegistry, SharedAgent};
use chrono::Utc;
use flock_kernel::agent::{AgentError, AgentInputs, AgentOutputs, HandOff, HandOffRule};
use flock_kernel::config::ChainConfig;
use flock_kernel::context::{FLOCK_CURRENT_AGENT, FlockContext};
use flock_kernel::resolver::resolve_inputs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span};

// ============================================================================
// 错误类型
// ============================================================================

/// 链执行结果类型
pub type ChainResult<T> = Result<T, ChainError>;

/// 链错误类别
/// Category of a chain failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainErrorKind {
    Lookup,
    Execution,
    HandOff,
    StepBudget,
}

/// 链执行错误
/// Chain execution error
///
/// Reported errors are the ones the activity boundary returns inside a
/// `{"status": "error", ..}` result instead of raising.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("Agent '{0}' not found.")]
    StartAgentNotFound(String),

    #[error("Next agent '{0}' not found.")]
    NextAgentNotFound(String),

    #[error("Agent '{agent}' failed: {source}")]
    Execution {
        agent: String,
        #[source]
        source: AgentError,
    },

    #[error("Handoff function error: {message}")]
    HandOff { agent: String, message: String },

    #[error("Step budget of {max_steps} agent runs exceeded")]
    StepBudgetExceeded { max_steps: usize },

    /// 从活动错误结果解码
    /// Decoded from an activity error result
    #[error("{message}")]
    Reported {
        kind: ChainErrorKind,
        message: String,
    },
}

impl ChainError {
    pub fn kind(&self) -> ChainErrorKind {
        match self {
            ChainError::StartAgentNotFound(_) | ChainError::NextAgentNotFound(_) => {
                ChainErrorKind::Lookup
            }
            ChainError::Execution { .. } => ChainErrorKind::Execution,
            ChainError::HandOff { .. } => ChainErrorKind::HandOff,
            ChainError::StepBudgetExceeded { .. } => ChainErrorKind::StepBudget,
            ChainError::Reported { kind, .. } => *kind,
        }
    }

    /// 是否以结构化错误结果返回
    /// Whether the failure is returned as a structured error result
    pub fn is_reported(&self) -> bool {
        !matches!(
            self,
            ChainError::StartAgentNotFound(_) | ChainError::Execution { .. }
        )
    }
}

// ============================================================================
// 引擎
// ============================================================================

/// 链执行选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainOptions {
    /// Upper bound on agent runs; unlimited when `None`.
    pub max_steps: Option<usize>,
}

impl From<&ChainConfig> for ChainOptions {
    fn from(config: &ChainConfig) -> Self {
        Self {
            max_steps: config.max_steps,
        }
    }
}

/// 执行引擎
/// Execution engine
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    registry: Arc<AgentRegistry>,
    options: ChainOptions,
}

impl ExecutionEngine {
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

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// 执行代理链
    /// Run the chain starting at `flock.current_agent`.
    ///
    /// Returns the output of the last agent. Every executed agent is recorded
    /// in `context` except one whose hand-off computation failed.
    pub async fn run_chain(&self, context: &mut FlockContext) -> ChainResult<AgentOutputs> {
        let span = info_span!("run_chain", run_id = %context.run_id());
        async move {
            let mut current = context.current_agent().unwrap_or_default().to_string();
            info!(initial_agent = %current, "Starting agent chain");

            let mut agent = match self.registry.get_agent(&current).await {
                Some(agent) => agent,
                None => {
                    error!(agent = %current, "Agent not found");
                    return Err(ChainError::StartAgentNotFound(current));
                }
            };
            agent.write().await.resolve_callables(context);

            let mut previous: Option<String> = None;
            let mut pending_input: Option<AgentInputs> = None;
            let mut steps = 0usize;

            loop {
                if let Some(max_steps) = self.options.max_steps {
                    if steps >= max_steps {
                        error!(max_steps, "Step budget exhausted");
                        return Err(ChainError::StepBudgetExceeded { max_steps });
                    }
                }
                steps += 1;

                let iteration = info_span!("agent_iteration", agent = %current, step = steps);
                let (result, hand_off) = self
                    .run_step(&agent, &current, previous.as_deref(), pending_input.take(), context)
                    .instrument(iteration)
                    .await?;

                let Some(hand_off) = hand_off else {
                    context.record(&current, &result, Utc::now(), None, previous.as_deref());
                    info!(agent = %current, "No handoff defined, completing chain");
                    return Ok(result);
                };

                context.record(
                    &current,
                    &result,
                    Utc::now(),
                    Some(hand_off.clone()),
                    previous.as_deref(),
                );

                let HandOff {
                    next_agent,
                    input,
                    context: overrides,
                } = hand_off;

                let next = match self.registry.get_agent(&next_agent).await {
                    Some(next) => next,
                    None => {
                        error!(agent = %next_agent, "Next agent not found");
                        return Err(ChainError::NextAgentNotFound(next_agent));
                    }
                };

                for (key, value) in overrides.unwrap_or_default() {
                    context.set_variable(key, value);
                }
                context.set_variable(FLOCK_CURRENT_AGENT, Value::String(next_agent.clone()));
                next.write().await.resolve_callables(context);
                info!(from = %current, next = %next_agent, "Handing off to next agent");

                pending_input = (!input.is_empty()).then_some(input);
                previous = Some(std::mem::replace(&mut current, next_agent));
                agent = next;
            }
        }
        .instrument(span)
        .await
    }

    /// Runs one agent and computes its hand-off. The read guard is released
    /// before the caller touches the next agent.
    async fn run_step(
        &self,
        agent: &SharedAgent,
        name: &str,
        previous: Option<&str>,
        input_override: Option<AgentInputs>,
        context: &FlockContext,
    ) -> ChainResult<(AgentOutputs, Option<HandOff>)> {
        let guard = agent.read().await;
        let spec = guard.spec();

        let input_spec = spec.input.resolve(context);
        let mut inputs = resolve_inputs(&input_spec, context, previous);
        if let Some(overrides) = input_override {
            inputs.extend(overrides);
        }
        debug!(agent = %name, inputs = ?inputs, "Resolved inputs");

        info!(agent = %name, "Executing agent");
        let result = match guard.run(inputs).await {
            Ok(result) => result,
            Err(source) => {
                error!(agent = %name, error = %source, "Agent execution failed");
                return Err(ChainError::Execution {
                    agent: name.to_string(),
                    source,
                });
            }
        };

        if !spec.config.disable_output {
            let rendered = serde_json::to_string(&result).unwrap_or_default();
            info!(agent = %name, output = %rendered, "Agent output");
        }

        let hand_off = match &spec.hand_off {
            HandOffRule::None => None,
            HandOffRule::Static(next) => Some(HandOff::to(next.clone())),
            HandOffRule::Dynamic(callable) => {
                debug!(agent = %name, label = callable.label(), "Executing handoff function");
                match callable.call(context, &result) {
                    Ok(hand_off) => hand_off,
                    Err(e) => {
                        error!(agent = %name, error = %e, "Handoff function error");
                        return Err(ChainError::HandOff {
                            agent: name.to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        };

        Ok((result, hand_off))
    }
}
