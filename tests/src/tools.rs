use async_trait::async_trait;
use flock_kernel::agent::{AgentResult, Tool};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A mock tool simulating a real agent tool
///
/// It allows developers to specify predefined execution outcomes
/// and track arguments that were passed to it during execution.
#[derive(Clone)]
pub struct MockTool {
    name: String,
    description: String,
    schema: Value,
    /// Value returned by every call
    pub stubbed_result: Arc<RwLock<AgentResult<Value>>>,
    /// Track all arguments passed to this tool
    pub call_history: Arc<RwLock<Vec<Value>>>,
}

impl MockTool {
    pub fn new(name: &str, description: &str, schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            stubbed_result: Arc::new(RwLock::new(Ok(Value::String(
                "Mock Execution Default".to_string(),
            )))),
            call_history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Sets the result this tool will produce when executed.
    pub async fn set_result(&self, result: AgentResult<Value>) {
        *self.stubbed_result.write().await = result;
    }

    /// Retrieve the history of calls made to this tool
    pub async fn history(&self) -> Vec<Value> {
        self.call_history.read().await.clone()
    }

    /// Check the total number of times this tool was executed
    pub async fn call_count(&self) -> usize {
        self.call_history.read().await.len()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn call(&self, args: Value) -> AgentResult<Value> {
        self.call_history.write().await.push(args);
        self.stubbed_result.read().await.clone()
    }
}

#[macro_export]
macro_rules! assert_tool_called {
    ($tool:expr, $expected_count:expr) => {
        let count = $tool.call_count().await;
        assert_eq!(
            count, $expected_count,
            "Expected tool '{}' to be called {} times, but was called {} times",
            $tool.name(),
            $expected_count,
            count
        );
    };
}
