//! 链执行上下文
//! Chain execution context
//!
//! `FlockContext` 是一次链执行中唯一的可变共享资源：
//! - 键值状态 (state)
//! - 只追加的运行历史 (history)
//! - Agent 定义 (agent_definitions)
//!
//! `FlockContext` is the single mutable resource of a chain run. The chain
//! driver owns it through `&mut FlockContext`; concurrent runs work on a
//! [`FlockContext::deepcopy`].

pub mod vars;

use crate::agent::handoff::HandOff;
use crate::agent::types::{AgentInputs, AgentOutputs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

pub use vars::*;

// ============================================================================
// 错误
// ============================================================================

/// 上下文操作结果类型
/// Context operation result type
pub type ContextResult<T> = Result<T, ContextError>;

/// 上下文错误类型
/// Context error type
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    /// 序列化失败
    /// Serialization failed
    #[error("Failed to serialize context: {0}")]
    Serialize(String),

    /// 反序列化失败 (结构无效)
    /// Deserialization failed (invalid structure)
    #[error("Failed to deserialize context: {0}")]
    Deserialize(String),
}

// ============================================================================
// 运行记录与定义
// ============================================================================

/// 一次 Agent 执行的记录
/// Record of a single agent execution
///
/// Created once by [`FlockContext::record`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRunRecord {
    /// Agent 名称
    pub agent: String,
    /// 输出数据快照
    pub data: AgentOutputs,
    /// 记录时间
    pub timestamp: DateTime<Utc>,
    /// 交接描述
    #[serde(default)]
    pub hand_off: Option<HandOff>,
    /// 调用方 Agent
    #[serde(default)]
    pub called_from: Option<String>,
}

/// 存储在上下文中的 Agent 定义
/// Agent definition stored in the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub agent_type: String,
    pub agent_name: String,
    pub agent_data: Value,
}

// ============================================================================
// FlockContext
// ============================================================================

/// 链执行上下文
/// Chain execution context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlockContext {
    #[serde(default)]
    state: HashMap<String, Value>,
    #[serde(default)]
    history: Vec<AgentRunRecord>,
    #[serde(default)]
    agent_definitions: HashMap<String, AgentDefinition>,
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    workflow_id: String,
    #[serde(default)]
    workflow_timestamp: String,
}

impl FlockContext {
    /// 创建空上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置状态变量
    /// Set a state variable
    pub fn set_variable(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// 获取状态变量
    /// Get a state variable
    pub fn get_variable(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn state(&self) -> &HashMap<String, Value> {
        &self.state
    }

    pub fn history(&self) -> &[AgentRunRecord] {
        &self.history
    }

    pub fn agent_definitions(&self) -> &HashMap<String, AgentDefinition> {
        &self.agent_definitions
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn set_run_id(&mut self, run_id: impl Into<String>) {
        self.run_id = run_id.into();
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn set_workflow_id(&mut self, workflow_id: impl Into<String>) {
        self.workflow_id = workflow_id.into();
    }

    pub fn workflow_timestamp(&self) -> &str {
        &self.workflow_timestamp
    }

    pub fn set_workflow_timestamp(&mut self, timestamp: impl Into<String>) {
        self.workflow_timestamp = timestamp.into();
    }

    /// 记录一次 Agent 执行
    /// Record an agent execution
    ///
    /// Appends a run record holding a copy of `data`, writes every output pair
    /// to `"<agent>.<key>"`, and updates `flock.last_agent` / `flock.last_result`.
    pub fn record(
        &mut self,
        agent_name: &str,
        data: &AgentOutputs,
        timestamp: DateTime<Utc>,
        hand_off: Option<HandOff>,
        called_from: Option<&str>,
    ) {
        self.history.push(AgentRunRecord {
            agent: agent_name.to_string(),
            data: data.clone(),
            timestamp,
            hand_off,
            called_from: called_from.map(str::to_string),
        });

        for (key, value) in data {
            self.state
                .insert(format!("{agent_name}.{key}"), value.clone());
        }

        self.state.insert(
            FLOCK_LAST_RESULT.to_string(),
            Value::Object(data.clone().into_iter().collect()),
        );
        self.state.insert(
            FLOCK_LAST_AGENT.to_string(),
            Value::String(agent_name.to_string()),
        );
    }

    /// 获取某个 Agent 的全部历史记录 (按时间顺序)
    /// All records of an agent, oldest first
    pub fn get_agent_history(&self, agent_name: &str) -> Vec<&AgentRunRecord> {
        self.history
            .iter()
            .filter(|record| record.agent == agent_name)
            .collect()
    }

    /// 从最新的记录开始查找键值
    /// Scan history newest-first for a record whose data contains `key`
    pub fn get_most_recent_value(&self, key: &str) -> Option<&Value> {
        self.history
            .iter()
            .rev()
            .find_map(|record| record.data.get(key))
    }

    pub fn get_agent_definition(&self, agent_name: &str) -> Option<&AgentDefinition> {
        self.agent_definitions.get(agent_name)
    }

    /// 添加 Agent 定义 (同名覆盖)
    /// Add an agent definition, replacing any with the same name
    pub fn add_agent_definition(
        &mut self,
        agent_type: impl Into<String>,
        agent_name: impl Into<String>,
        agent_data: Value,
    ) {
        let agent_name = agent_name.into();
        self.agent_definitions.insert(
            agent_name.clone(),
            AgentDefinition {
                agent_type: agent_type.into(),
                agent_name,
                agent_data,
            },
        );
    }

    /// 属性访问，用于 `context.<attr>` 输入解析
    /// Attribute-style access used by `context.<attr>` input resolution
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "state" => serde_json::to_value(&self.state).ok(),
            "history" => serde_json::to_value(&self.history).ok(),
            "agent_definitions" => serde_json::to_value(&self.agent_definitions).ok(),
            "run_id" => Some(Value::String(self.run_id.clone())),
            "workflow_id" => Some(Value::String(self.workflow_id.clone())),
            "workflow_timestamp" => Some(Value::String(self.workflow_timestamp.clone())),
            _ => None,
        }
    }

    /// 初始化链执行所需的保留变量
    /// Seed the reserved variables for a chain run
    pub fn initialize(
        &mut self,
        agent_name: &str,
        input: &AgentInputs,
        run_id: &str,
        local_debug: bool,
    ) {
        self.set_variable(FLOCK_CURRENT_AGENT, Value::String(agent_name.to_string()));

        for (key, value) in input {
            self.set_variable(input_key(key), value.clone());
        }

        self.set_variable(
            FLOCK_INITIAL_INPUT,
            Value::Object(input.clone().into_iter().collect()),
        );
        self.set_variable(FLOCK_LOCAL_DEBUG, Value::Bool(local_debug));
        self.set_variable(FLOCK_RUN_ID, Value::String(run_id.to_string()));
        self.run_id = run_id.to_string();
    }

    /// 当前 Agent 名称
    pub fn current_agent(&self) -> Option<&str> {
        self.get_variable(FLOCK_CURRENT_AGENT).and_then(Value::as_str)
    }

    // ========================================================================
    // 序列化
    // ========================================================================

    /// 序列化为 JSON
    /// Serialize into the JSON wire format
    pub fn to_dict(&self) -> ContextResult<Value> {
        serde_json::to_value(self).map_err(|e| ContextError::Serialize(e.to_string()))
    }

    /// 从 JSON 反序列化
    /// Rebuild a context from its JSON wire format
    pub fn from_dict(data: &Value) -> ContextResult<Self> {
        Self::deserialize(data).map_err(|e| ContextError::Deserialize(e.to_string()))
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> ContextResult<String> {
        serde_json::to_string(self).map_err(|e| ContextError::Serialize(e.to_string()))
    }

    /// 从 JSON 字符串反序列化
    pub fn from_json(json: &str) -> ContextResult<Self> {
        serde_json::from_str(json).map_err(|e| ContextError::Deserialize(e.to_string()))
    }

    /// 深拷贝，隔离并发执行
    /// Deep copy through the wire format
    pub fn deepcopy(&self) -> ContextResult<Self> {
        Self::from_dict(&self.to_dict()?)
    }
}
