//! 可调用对象
//! Labeled callables
//!
//! Functions that appear in an agent definition (dynamic input/output specs,
//! hand-off rules, termination predicates, lifecycle callbacks) carry a stable
//! label. The label is what crosses a serialization boundary; the function is
//! looked up again in a [`CallableTable`] on the other side.

use super::error::{AgentError, AgentResult};
use super::handoff::HandOff;
use super::tool::SharedTool;
use super::types::{AgentInputs, AgentOutputs};
use crate::context::FlockContext;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// 函数签名
// ============================================================================

/// Produces an input/output/description spec from the live context.
pub type SpecFn = dyn Fn(&FlockContext) -> String + Send + Sync;

/// Computes the next hand-off from the context and the agent's result.
/// `Ok(None)` ends the chain.
pub type HandOffFn =
    dyn Fn(&FlockContext, &AgentOutputs) -> AgentResult<Option<HandOff>> + Send + Sync;

/// Termination predicate over an agent's outputs.
pub type TerminationFn = dyn Fn(&AgentOutputs) -> bool + Send + Sync;

/// Initialize callback: `(agent_name, inputs) -> inputs`.
pub type InitializeFn = dyn Fn(&str, AgentInputs) -> AgentResult<AgentInputs> + Send + Sync;

/// Terminate callback: `(agent_name, inputs, outputs)`.
pub type TerminateFn = dyn Fn(&str, &AgentInputs, &AgentOutputs) -> AgentResult<()> + Send + Sync;

/// Error callback: `(agent_name, error, inputs)`.
pub type ErrorFn = dyn Fn(&str, &AgentError, &AgentInputs) + Send + Sync;

// ============================================================================
// Callable
// ============================================================================

/// 带标签的函数
/// A function with a stable label
pub struct Callable<F: ?Sized> {
    label: String,
    func: Arc<F>,
}

pub type SpecCallable = Callable<SpecFn>;
pub type HandOffCallable = Callable<HandOffFn>;
pub type TerminationCallable = Callable<TerminationFn>;
pub type InitializeCallable = Callable<InitializeFn>;
pub type TerminateCallable = Callable<TerminateFn>;
pub type ErrorCallable = Callable<ErrorFn>;

impl<F: ?Sized> Callable<F> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 序列化形式 `{"callable": "<label>"}`
    /// Wire form `{"callable": "<label>"}`
    pub fn to_reference(&self) -> Value {
        json!({ CALLABLE_KEY: self.label })
    }
}

impl<F: ?Sized> Clone for Callable<F> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Callable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.label).finish()
    }
}

impl SpecCallable {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&FlockContext) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, context: &FlockContext) -> String {
        (self.func)(context)
    }
}

impl HandOffCallable {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&FlockContext, &AgentOutputs) -> AgentResult<Option<HandOff>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(
        &self,
        context: &FlockContext,
        result: &AgentOutputs,
    ) -> AgentResult<Option<HandOff>> {
        (self.func)(context, result)
    }
}

impl TerminationCallable {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&AgentOutputs) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, outputs: &AgentOutputs) -> bool {
        (self.func)(outputs)
    }
}

impl InitializeCallable {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&str, AgentInputs) -> AgentResult<AgentInputs> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, agent_name: &str, inputs: AgentInputs) -> AgentResult<AgentInputs> {
        (self.func)(agent_name, inputs)
    }
}

impl TerminateCallable {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&str, &AgentInputs, &AgentOutputs) -> AgentResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(
        &self,
        agent_name: &str,
        inputs: &AgentInputs,
        outputs: &AgentOutputs,
    ) -> AgentResult<()> {
        (self.func)(agent_name, inputs, outputs)
    }
}

impl ErrorCallable {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&str, &AgentError, &AgentInputs) + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn call(&self, agent_name: &str, error: &AgentError, inputs: &AgentInputs) {
        (self.func)(agent_name, error, inputs)
    }
}

/// Key of the serialized callable reference.
pub const CALLABLE_KEY: &str = "callable";

/// 读取 `{"callable": "<label>"}` 中的标签
/// Label of a serialized callable reference, if `value` is one
pub fn callable_label(value: &Value) -> Option<&str> {
    value.as_object()?.get(CALLABLE_KEY)?.as_str()
}

// ============================================================================
// CallableTable
// ============================================================================

/// 已注册的可调用对象
/// A registered callable of any kind
#[derive(Debug, Clone)]
pub enum CallableEntry {
    Spec(SpecCallable),
    HandOff(HandOffCallable),
    Termination(TerminationCallable),
    Initialize(InitializeCallable),
    Terminate(TerminateCallable),
    OnError(ErrorCallable),
}

impl CallableEntry {
    pub fn label(&self) -> &str {
        match self {
            CallableEntry::Spec(c) => c.label(),
            CallableEntry::HandOff(c) => c.label(),
            CallableEntry::Termination(c) => c.label(),
            CallableEntry::Initialize(c) => c.label(),
            CallableEntry::Terminate(c) => c.label(),
            CallableEntry::OnError(c) => c.label(),
        }
    }
}

macro_rules! entry_getter {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $fn_name(&self, label: &str) -> AgentResult<$ty> {
            match self.entries.get(label) {
                Some(CallableEntry::$variant(c)) => Ok(c.clone()),
                _ => Err(AgentError::CallableNotFound(label.to_string())),
            }
        }
    };
}

/// 标签到函数、名称到工具的查找表
/// Label-to-function and name-to-tool lookup table
///
/// The first registration of a label wins; later ones are ignored with a warning.
#[derive(Debug, Clone, Default)]
pub struct CallableTable {
    entries: HashMap<String, CallableEntry>,
    tools: HashMap<String, SharedTool>,
}

impl CallableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册可调用对象
    /// Register a callable under its label
    pub fn register(&mut self, entry: CallableEntry) {
        let label = entry.label().to_string();
        if self.entries.contains_key(&label) {
            warn!(label = %label, "Callable already registered, keeping the first one");
            return;
        }
        self.entries.insert(label, entry);
    }

    /// 注册工具
    /// Register a tool under its name
    pub fn register_tool(&mut self, tool: SharedTool) {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            warn!(tool = %name, "Tool already registered, keeping the first one");
            return;
        }
        self.tools.insert(name, tool);
    }

    pub fn tool(&self, name: &str) -> AgentResult<SharedTool> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    entry_getter!(spec, Spec, SpecCallable);
    entry_getter!(hand_off, HandOff, HandOffCallable);
    entry_getter!(termination, Termination, TerminationCallable);
    entry_getter!(initialize, Initialize, InitializeCallable);
    entry_getter!(terminate, Terminate, TerminateCallable);
    entry_getter!(on_error, OnError, ErrorCallable);
}
