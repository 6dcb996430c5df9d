//! 工具适配器
//! Tool adapters
//!
//! 提供便捷的工具创建方式
//! Convenient ways to create tools

use async_trait::async_trait;
use flock_kernel::agent::{AgentResult, Tool};
use serde_json::Value;
use std::future::Future;

/// 异步函数工具
/// Async function tool
///
/// # 示例
///
/// ```rust
/// use flock_foundation::agent::tools::FnTool;
/// use serde_json::json;
///
/// let tool = FnTool::new("web_search", "Search the web", |args: serde_json::Value| async move {
///     let query = args["query"].as_str().unwrap_or_default().to_string();
///     Ok::<_, flock_kernel::agent::AgentError>(json!({ "results": [query] }))
/// });
/// ```
pub struct FnTool<F> {
    name: String,
    description: String,
    parameters_schema: Value,
    handler: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = AgentResult<Value>> + Send,
{
    /// 创建新的函数工具
    /// Create a new function tool
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler,
        }
    }

    /// 设置参数 Schema
    /// Set parameters schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameters_schema = schema;
        self
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = AgentResult<Value>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters_schema.clone()
    }

    async fn call(&self, args: Value) -> AgentResult<Value> {
        (self.handler)(args).await
    }
}

/// 同步闭包工具
/// Synchronous closure tool
pub struct ClosureTool<F> {
    name: String,
    description: String,
    parameters_schema: Value,
    handler: F,
}

impl<F> ClosureTool<F>
where
    F: Fn(Value) -> AgentResult<Value> + Send + Sync,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameters_schema = schema;
        self
    }
}

#[async_trait]
impl<F> Tool for ClosureTool<F>
where
    F: Fn(Value) -> AgentResult<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters_schema.clone()
    }

    async fn call(&self, args: Value) -> AgentResult<Value> {
        (self.handler)(args)
    }
}
