//! Agent 核心接口
//! Core agent contract
//!
//! 生命周期 / Lifecycle:
//!
//! ```text
//! declared ──resolve_callables──▶ resolved ──run──▶ executing ──▶ terminal
//! ```
//!
//! `run` calls `initialize`, `evaluate` and `terminate` in order. If any of
//! them fails, `on_error` is invoked and the error is returned unchanged.

use super::callable::CallableEntry;
use super::error::{AgentError, AgentResult};
use super::spec::AgentSpec;
use super::types::{AgentInputs, AgentOutputs};
use crate::context::FlockContext;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{Instrument, error, info, info_span};

/// 声明式 Agent Trait
/// Declarative agent trait
///
/// # 示例
///
/// ```rust,ignore
/// struct Upper { spec: AgentSpec }
///
/// #[async_trait]
/// impl Agent for Upper {
///     fn spec(&self) -> &AgentSpec { &self.spec }
///     fn spec_mut(&mut self) -> &mut AgentSpec { &mut self.spec }
///     fn agent_type_name(&self) -> &str { "Upper" }
///
///     async fn evaluate(&self, inputs: &AgentInputs) -> AgentResult<AgentOutputs> {
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    fn spec(&self) -> &AgentSpec;

    fn spec_mut(&mut self) -> &mut AgentSpec;

    /// 类型名，写入上下文中的 Agent 定义
    /// Type name stored in the context's agent definitions
    fn agent_type_name(&self) -> &str;

    fn name(&self) -> &str {
        &self.spec().name
    }

    /// 初始化钩子，可修改输入
    /// Initialize hook; may rewrite the inputs
    async fn initialize(&self, inputs: AgentInputs) -> AgentResult<AgentInputs> {
        Ok(inputs)
    }

    /// 核心求值
    /// Core evaluation
    async fn evaluate(&self, inputs: &AgentInputs) -> AgentResult<AgentOutputs>;

    async fn terminate(&self, _inputs: &AgentInputs, _outputs: &AgentOutputs) -> AgentResult<()> {
        Ok(())
    }

    async fn on_error(&self, _error: &AgentError, _inputs: &AgentInputs) {}

    /// 执行完整生命周期
    /// Run the full lifecycle. Callbacks in the spec take precedence over
    /// the hook implementations.
    async fn run(&self, inputs: AgentInputs) -> AgentResult<AgentOutputs> {
        let span = info_span!("agent.run", agent = %self.name());
        async move {
            let original = inputs.clone();
            let inputs = match dispatch_initialize(self, inputs).await {
                Ok(inputs) => inputs,
                Err(e) => return Err(fail(self, e, &original).await),
            };

            let outputs = match self.evaluate(&inputs).await {
                Ok(outputs) => outputs,
                Err(e) => return Err(fail(self, e, &inputs).await),
            };

            if let Err(e) = dispatch_terminate(self, &inputs, &outputs).await {
                return Err(fail(self, e, &inputs).await);
            }

            info!("Agent run completed");
            Ok(outputs)
        }
        .instrument(span)
        .await
    }

    /// 解析动态字段
    /// Resolve dynamic spec fields against the context
    fn resolve_callables(&mut self, context: &FlockContext) {
        self.spec_mut().resolve_callables(context);
    }

    /// 序列化的定义数据
    /// Serialized definition data
    fn to_dict(&self) -> Value {
        self.spec().to_dict()
    }

    /// 需要注册到 [`CallableTable`](super::CallableTable) 的可调用对象
    /// Callables to register so [`to_dict`](Agent::to_dict) output can be restored
    fn callable_entries(&self) -> Vec<CallableEntry> {
        self.spec().callable_entries()
    }
}

async fn dispatch_initialize<A: Agent + ?Sized>(
    agent: &A,
    inputs: AgentInputs,
) -> AgentResult<AgentInputs> {
    match &agent.spec().callbacks.initialize {
        Some(callback) => callback.call(agent.name(), inputs),
        None => agent.initialize(inputs).await,
    }
}

async fn dispatch_terminate<A: Agent + ?Sized>(
    agent: &A,
    inputs: &AgentInputs,
    outputs: &AgentOutputs,
) -> AgentResult<()> {
    match &agent.spec().callbacks.terminate {
        Some(callback) => callback.call(agent.name(), inputs, outputs),
        None => agent.terminate(inputs, outputs).await,
    }
}

async fn fail<A: Agent + ?Sized>(agent: &A, err: AgentError, inputs: &AgentInputs) -> AgentError {
    error!(error = %err, "Error running agent");
    match &agent.spec().callbacks.on_error {
        Some(callback) => callback.call(agent.name(), &err, inputs),
        None => agent.on_error(&err, inputs).await,
    }
    err
}
