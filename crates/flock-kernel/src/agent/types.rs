//! Agent 输入输出类型
//! Agent input/output types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Agent 输入映射
/// Resolved input mapping handed to an agent
pub type AgentInputs = HashMap<String, Value>;

/// Agent 输出映射
/// Output mapping produced by an agent
pub type AgentOutputs = HashMap<String, Value>;

/// 求值策略
/// Evaluation strategy requested from the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// 单次补全
    Completion,
    /// 推理 + 工具调用
    ReAct,
    /// 思维链
    ChainOfThought,
}

impl AgentType {
    /// Default strategy: `ReAct` when tools are attached, `Completion` otherwise.
    pub fn for_tools(has_tools: bool) -> Self {
        if has_tools {
            AgentType::ReAct
        } else {
            AgentType::Completion
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentType::Completion => "completion",
            AgentType::ReAct => "re_act",
            AgentType::ChainOfThought => "chain_of_thought",
        };
        f.write_str(s)
    }
}
