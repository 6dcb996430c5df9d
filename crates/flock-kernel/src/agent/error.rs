//! Agent 错误类型定义
//! Agent error type definitions
//!
//! 统一的 Agent 错误处理
//! Unified agent error handling

use thiserror::Error;

/// Agent 操作结果类型
/// Agent operation result type
pub type AgentResult<T> = Result<T, AgentError>;

/// Agent 错误类型
/// Agent error type
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// Agent 未找到
    /// Agent not found
    #[error("Agent not found: {0}")]
    NotFound(String),

    /// Agent 执行失败
    /// Agent execution failed
    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),

    /// 初始化钩子失败
    /// Initialize hook failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// 终止钩子失败
    /// Terminate hook failed
    #[error("Agent termination failed: {0}")]
    TerminationFailed(String),

    /// 工具执行失败
    /// Tool execution failed
    #[error("Tool execution failed: {tool_name}: {message}")]
    ToolExecutionFailed { tool_name: String, message: String },

    /// 工具未找到
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// 可调用对象未注册
    /// Callable label not registered
    #[error("Callable not registered: {0}")]
    CallableNotFound(String),

    /// 无效输入
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 无效输出
    /// Invalid output
    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    /// 超时错误
    /// Timeout
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// 资源不可用 (可重试)
    /// Resource unavailable (retryable)
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// 序列化错误
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 内部错误
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// 其他错误
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// 创建工具执行失败错误
    /// Create a tool execution failure
    pub fn tool_execution_failed(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecutionFailed {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// 创建超时错误
    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Whether a retry at the workflow layer may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::Timeout { .. } | AgentError::ResourceUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::NotFound("bloggy".to_string());
        assert_eq!(err.to_string(), "Agent not found: bloggy");
    }

    #[test]
    fn test_tool_execution_failed() {
        let err = AgentError::tool_execution_failed("web_search", "rate limited");
        assert!(err.to_string().contains("web_search"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::timeout(500).is_retryable());
        assert!(AgentError::ResourceUnavailable("busy".into()).is_retryable());
        assert!(!AgentError::InvalidInput("x".into()).is_retryable());
    }
}
