//! 工具接口
//! Tool interface
//!
//! Concrete tools (web search, file access, ...) live outside the kernel; an
//! agent only needs a name, a description for the model, and an async call.

use super::error::AgentResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// 统一工具 Trait
/// Unified tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称 (唯一标识符)
    /// Tool name (unique identifier)
    fn name(&self) -> &str;

    /// 工具描述 (用于 LLM 理解)
    /// Tool description (for LLM understanding)
    fn description(&self) -> &str;

    /// 参数 JSON Schema
    /// Parameters JSON Schema
    fn parameters_schema(&self) -> Value {
        serde_json::json!({ "type": "object" })
    }

    /// 调用工具
    /// Invoke the tool with JSON arguments
    async fn call(&self, args: Value) -> AgentResult<Value>;
}

/// 共享工具引用
pub type SharedTool = Arc<dyn Tool>;

impl fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}
