//! Agent 声明
//! Declarative agent specification
//!
//! An [`AgentSpec`] names an agent's inputs and outputs instead of a prompt.
//! Fields that may be computed at run time (`input`, `output`, `description`,
//! `hand_off`, `termination`) are tagged variants holding either a static
//! value or a labeled [`Callable`](super::callable::Callable).

use super::callable::{
    CallableEntry, CallableTable, HandOffCallable, SpecCallable, TerminationCallable,
    callable_label,
};
use super::callbacks::AgentCallbacks;
use super::core::Agent;
use super::error::{AgentError, AgentResult};
use super::tool::SharedTool;
use super::types::{AgentOutputs, AgentType};
use crate::context::FlockContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

/// 默认模型
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";

// ============================================================================
// 可动态计算的字段
// ============================================================================

/// Static string or a callable producing it from the context.
#[derive(Debug, Clone)]
pub enum SpecValue {
    Static(String),
    Dynamic(SpecCallable),
}

impl SpecValue {
    /// 静态值；未解析的动态值返回 `None`
    pub fn as_static(&self) -> Option<&str> {
        match self {
            SpecValue::Static(s) => Some(s),
            SpecValue::Dynamic(_) => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, SpecValue::Dynamic(_))
    }

    /// Evaluate against `context` without storing the result.
    pub fn resolve(&self, context: &FlockContext) -> String {
        match self {
            SpecValue::Static(s) => s.clone(),
            SpecValue::Dynamic(c) => c.call(context),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SpecValue::Static(s) => Value::String(s.clone()),
            SpecValue::Dynamic(c) => c.to_reference(),
        }
    }

    fn from_json(field: &str, value: Option<&Value>, table: &CallableTable) -> AgentResult<Self> {
        match value {
            None | Some(Value::Null) => Ok(SpecValue::default()),
            Some(Value::String(s)) => Ok(SpecValue::Static(s.clone())),
            Some(other) => match callable_label(other) {
                Some(label) => Ok(SpecValue::Dynamic(table.spec(label)?)),
                None => Err(invalid_field(field, other)),
            },
        }
    }
}

impl Default for SpecValue {
    fn default() -> Self {
        SpecValue::Static(String::new())
    }
}

impl From<&str> for SpecValue {
    fn from(s: &str) -> Self {
        SpecValue::Static(s.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(s: String) -> Self {
        SpecValue::Static(s)
    }
}

impl From<SpecCallable> for SpecValue {
    fn from(c: SpecCallable) -> Self {
        SpecValue::Dynamic(c)
    }
}

/// 交接规则
/// Hand-off rule
#[derive(Debug, Clone, Default)]
pub enum HandOffRule {
    /// 链在此结束
    #[default]
    None,
    /// 固定的下一个 Agent
    Static(String),
    /// `(context, result) -> Option<HandOff>`
    Dynamic(HandOffCallable),
}

impl HandOffRule {
    /// 固定交接到指定 Agent，按名称保存
    /// Static hand-off to `agent`, stored by name
    pub fn to_agent<A: Agent + ?Sized>(agent: &A) -> Self {
        HandOffRule::Static(agent.name().to_string())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HandOffRule::None)
    }

    fn to_json(&self) -> Value {
        match self {
            HandOffRule::None => Value::Null,
            HandOffRule::Static(name) => Value::String(name.clone()),
            HandOffRule::Dynamic(c) => c.to_reference(),
        }
    }

    fn from_json(value: Option<&Value>, table: &CallableTable) -> AgentResult<Self> {
        match value {
            None | Some(Value::Null) => Ok(HandOffRule::None),
            Some(Value::String(name)) => Ok(HandOffRule::Static(name.clone())),
            Some(other) => match callable_label(other) {
                Some(label) => Ok(HandOffRule::Dynamic(table.hand_off(label)?)),
                None => Err(invalid_field("hand_off", other)),
            },
        }
    }
}

impl From<&str> for HandOffRule {
    fn from(name: &str) -> Self {
        HandOffRule::Static(name.to_string())
    }
}

impl From<String> for HandOffRule {
    fn from(name: String) -> Self {
        HandOffRule::Static(name)
    }
}

impl From<HandOffCallable> for HandOffRule {
    fn from(c: HandOffCallable) -> Self {
        HandOffRule::Dynamic(c)
    }
}

/// 终止条件
/// Termination condition
#[derive(Debug, Clone, Default)]
pub enum Termination {
    #[default]
    None,
    /// Met when any string output contains the phrase.
    Phrase(String),
    Predicate(TerminationCallable),
}

impl Termination {
    pub fn is_met(&self, outputs: &AgentOutputs) -> bool {
        match self {
            Termination::None => false,
            Termination::Phrase(phrase) => {
                !phrase.is_empty()
                    && outputs
                        .values()
                        .filter_map(Value::as_str)
                        .any(|s| s.contains(phrase.as_str()))
            }
            Termination::Predicate(c) => c.call(outputs),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Termination::None => Value::Null,
            Termination::Phrase(p) => Value::String(p.clone()),
            Termination::Predicate(c) => c.to_reference(),
        }
    }

    fn from_json(value: Option<&Value>, table: &CallableTable) -> AgentResult<Self> {
        match value {
            None | Some(Value::Null) => Ok(Termination::None),
            Some(Value::String(p)) => Ok(Termination::Phrase(p.clone())),
            Some(other) => match callable_label(other) {
                Some(label) => Ok(Termination::Predicate(table.termination(label)?)),
                None => Err(invalid_field("termination", other)),
            },
        }
    }
}

impl From<&str> for Termination {
    fn from(phrase: &str) -> Self {
        Termination::Phrase(phrase.to_string())
    }
}

impl From<TerminationCallable> for Termination {
    fn from(c: TerminationCallable) -> Self {
        Termination::Predicate(c)
    }
}

fn invalid_field(field: &str, value: &Value) -> AgentError {
    AgentError::SerializationError(format!("Invalid value for '{field}': {value}"))
}

// ============================================================================
// 配置
// ============================================================================

/// Agent 配置
/// Per-agent configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Forces an evaluation strategy regardless of attached tools.
    #[serde(default)]
    pub agent_type_override: Option<AgentType>,
    /// Suppresses logging of this agent's output by the chain driver.
    #[serde(default)]
    pub disable_output: bool,
}

// ============================================================================
// AgentSpec
// ============================================================================

/// 声明式 Agent 定义
/// Declarative agent definition
///
/// # 示例
///
/// ```rust
/// use flock_kernel::agent::AgentSpec;
///
/// let spec = AgentSpec::new("bloggy")
///     .with_input("blog_idea")
///     .with_output("funny_blog_title, blog_headers");
/// assert_eq!(spec.input.as_static(), Some("blog_idea"));
/// ```
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    /// `None` means the orchestrator's default model.
    pub model: Option<String>,
    pub description: SpecValue,
    pub input: SpecValue,
    pub output: SpecValue,
    pub tools: Vec<SharedTool>,
    pub use_cache: bool,
    pub hand_off: HandOffRule,
    pub termination: Termination,
    pub callbacks: AgentCallbacks,
    pub config: AgentConfig,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            description: SpecValue::default(),
            input: SpecValue::default(),
            output: SpecValue::default(),
            tools: Vec::new(),
            use_cache: true,
            hand_off: HandOffRule::None,
            termination: Termination::None,
            callbacks: AgentCallbacks::default(),
            config: AgentConfig::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<SpecValue>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_input(mut self, input: impl Into<SpecValue>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<SpecValue>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_tool(mut self, tool: SharedTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_hand_off(mut self, hand_off: impl Into<HandOffRule>) -> Self {
        self.hand_off = hand_off.into();
        self
    }

    pub fn with_termination(mut self, termination: impl Into<Termination>) -> Self {
        self.termination = termination.into();
        self
    }

    pub fn with_callbacks(mut self, callbacks: AgentCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_agent_type(mut self, agent_type: AgentType) -> Self {
        self.config.agent_type_override = Some(agent_type);
        self
    }

    pub fn with_output_disabled(mut self) -> Self {
        self.config.disable_output = true;
        self
    }

    /// 实际使用的模型
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// 实际使用的求值策略
    /// Effective evaluation strategy
    pub fn agent_type(&self) -> AgentType {
        self.config
            .agent_type_override
            .unwrap_or_else(|| AgentType::for_tools(!self.tools.is_empty()))
    }

    /// 将动态字段解析为静态字符串 (幂等)
    /// Turn dynamic `input`/`output`/`description` into static strings.
    /// Idempotent: already-static fields are left untouched.
    pub fn resolve_callables(&mut self, context: &FlockContext) {
        for (field, value) in [
            ("description", &mut self.description),
            ("input", &mut self.input),
            ("output", &mut self.output),
        ] {
            if let SpecValue::Dynamic(c) = value {
                let resolved = c.call(context);
                debug!(agent = %self.name, field, label = c.label(), resolved = %resolved, "Resolved callable");
                *value = SpecValue::Static(resolved);
            }
        }
    }

    /// 所有需要注册的可调用对象
    /// Every callable this spec references
    pub fn callable_entries(&self) -> Vec<CallableEntry> {
        let mut entries = Vec::new();
        for value in [&self.description, &self.input, &self.output] {
            if let SpecValue::Dynamic(c) = value {
                entries.push(CallableEntry::Spec(c.clone()));
            }
        }
        if let HandOffRule::Dynamic(c) = &self.hand_off {
            entries.push(CallableEntry::HandOff(c.clone()));
        }
        if let Termination::Predicate(c) = &self.termination {
            entries.push(CallableEntry::Termination(c.clone()));
        }
        entries.extend(self.callbacks.entries());
        entries
    }

    // ========================================================================
    // 序列化
    // ========================================================================

    /// 序列化为 JSON，可调用对象以标签表示
    /// Serialize to JSON; callables become `{"callable": "<label>"}`
    pub fn to_dict(&self) -> Value {
        let callback = |c: Option<Value>| c.unwrap_or(Value::Null);
        json!({
            "name": self.name,
            "model": self.model,
            "description": self.description.to_json(),
            "input": self.input.to_json(),
            "output": self.output.to_json(),
            "tools": self.tools.iter().map(|t| t.name().to_string()).collect::<Vec<_>>(),
            "use_cache": self.use_cache,
            "hand_off": self.hand_off.to_json(),
            "termination": self.termination.to_json(),
            "initialize_callback": callback(self.callbacks.initialize.as_ref().map(|c| c.to_reference())),
            "terminate_callback": callback(self.callbacks.terminate.as_ref().map(|c| c.to_reference())),
            "on_error_callback": callback(self.callbacks.on_error.as_ref().map(|c| c.to_reference())),
            "config": self.config,
        })
    }

    /// 从 JSON 恢复，可调用对象与工具从 `table` 查找
    /// Rebuild from JSON, restoring callables and tools from `table`
    pub fn from_dict(data: &Value, table: &CallableTable) -> AgentResult<Self> {
        let obj = data
            .as_object()
            .ok_or_else(|| AgentError::SerializationError("Agent data must be an object".into()))?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::SerializationError("Agent data is missing 'name'".into()))?;

        let mut spec = AgentSpec::new(name);
        spec.model = obj.get("model").and_then(Value::as_str).map(str::to_string);
        spec.description = SpecValue::from_json("description", obj.get("description"), table)?;
        spec.input = SpecValue::from_json("input", obj.get("input"), table)?;
        spec.output = SpecValue::from_json("output", obj.get("output"), table)?;

        if let Some(tools) = obj.get("tools").and_then(Value::as_array) {
            for tool in tools {
                let tool_name = tool
                    .as_str()
                    .ok_or_else(|| invalid_field("tools", tool))?;
                spec.tools.push(table.tool(tool_name)?);
            }
        }

        if let Some(use_cache) = obj.get("use_cache").and_then(Value::as_bool) {
            spec.use_cache = use_cache;
        }
        spec.hand_off = HandOffRule::from_json(obj.get("hand_off"), table)?;
        spec.termination = Termination::from_json(obj.get("termination"), table)?;
        spec.callbacks = callbacks_from_json(obj, table)?;

        if let Some(config) = obj.get("config") {
            if !config.is_null() {
                spec.config = serde_json::from_value(config.clone())?;
            }
        }

        Ok(spec)
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> String {
        self.to_dict().to_string()
    }

    /// 从 JSON 字符串恢复
    /// Parse then rebuild through [`AgentSpec::from_dict`]
    pub fn from_json(json: &str, table: &CallableTable) -> AgentResult<Self> {
        let data: Value = serde_json::from_str(json)?;
        Self::from_dict(&data, table)
    }
}

fn callbacks_from_json(obj: &Map<String, Value>, table: &CallableTable) -> AgentResult<AgentCallbacks> {
    let label = |key: &str| -> AgentResult<Option<String>> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => callable_label(value)
                .map(|l| Some(l.to_string()))
                .ok_or_else(|| invalid_field(key, value)),
        }
    };

    let mut callbacks = AgentCallbacks::default();
    if let Some(l) = label("initialize_callback")? {
        callbacks.initialize = Some(table.initialize(&l)?);
    }
    if let Some(l) = label("terminate_callback")? {
        callbacks.terminate = Some(table.terminate(&l)?);
    }
    if let Some(l) = label("on_error_callback")? {
        callbacks.on_error = Some(table.on_error(&l)?);
    }
    Ok(callbacks)
}
