//! Agent 注册中心
//!
//! 按名称保存 Agent 与工具，并收集可调用对象以便跨边界恢复
//! Agents and tools by name, plus the callable table used to restore
//! serialized specs on the other side of the workflow boundary

use flock_kernel::agent::{Agent, CallableTable, SharedTool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// 共享的 Agent 句柄
/// Shared agent handle
pub type SharedAgent = Arc<RwLock<dyn Agent>>;

// ============================================================================
// 注册中心
// ============================================================================

/// Agent 注册中心
///
/// Re-registration is not rejected: the first registration of a name stays
/// in place and later ones are ignored with a warning.
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, SharedAgent>>,
    callables: RwLock<CallableTable>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Agent，返回共享句柄
    /// Register an agent and return its shared handle.
    ///
    /// If the name is taken, the existing handle is returned instead.
    pub async fn register_agent<A: Agent>(&self, agent: A) -> SharedAgent {
        self.register_shared(Arc::new(RwLock::new(agent))).await
    }

    /// 注册已共享的 Agent
    /// Register an already shared agent
    pub async fn register_shared(&self, agent: SharedAgent) -> SharedAgent {
        let (name, agent_type, entries, tools) = {
            let guard = agent.read().await;
            (
                guard.name().to_string(),
                guard.agent_type_name().to_string(),
                guard.callable_entries(),
                guard.spec().tools.clone(),
            )
        };

        let mut agents = self.agents.write().await;
        if let Some(existing) = agents.get(&name) {
            warn!(agent = %name, "Agent already registered, keeping the first one");
            return existing.clone();
        }

        {
            let mut callables = self.callables.write().await;
            for entry in entries {
                callables.register(entry);
            }
            for tool in tools {
                callables.register_tool(tool);
            }
        }

        debug!(agent = %name, agent_type = %agent_type, "Registered agent");
        agents.insert(name, agent.clone());
        agent
    }

    /// 按名称查找 Agent
    /// Look up an agent by name
    pub async fn get_agent(&self, name: &str) -> Option<SharedAgent> {
        self.agents.read().await.get(name).cloned()
    }

    /// 已注册名称，按字母排序
    pub async fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// 注册工具
    /// Register a tool; the first registration of a name wins
    pub async fn register_tool(&self, tool: SharedTool) {
        self.callables.write().await.register_tool(tool);
    }

    pub async fn get_tool(&self, name: &str) -> Option<SharedTool> {
        self.callables.read().await.tool(name).ok()
    }

    /// 可调用对象表快照
    /// Snapshot of the callable table
    pub async fn callables(&self) -> CallableTable {
        self.callables.read().await.clone()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flock_kernel::agent::{
        AgentInputs, AgentOutputs, AgentResult, AgentSpec, HandOffCallable, Tool,
    };
    use serde_json::{Value, json};

    struct Fixed {
        spec: AgentSpec,
        tag: &'static str,
    }

    #[async_trait]
    impl Agent for Fixed {
        fn spec(&self) -> &AgentSpec {
            &self.spec
        }

        fn spec_mut(&mut self) -> &mut AgentSpec {
            &mut self.spec
        }

        fn agent_type_name(&self) -> &str {
            "Fixed"
        }

        async fn evaluate(&self, _inputs: &AgentInputs) -> AgentResult<AgentOutputs> {
            Ok(AgentOutputs::from([("tag".to_string(), json!(self.tag))]))
        }
    }

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Returns its arguments"
        }

        async fn call(&self, args: Value) -> AgentResult<Value> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn test_first_registration_wins() {
        let registry = AgentRegistry::new();
        registry
            .register_agent(Fixed {
                spec: AgentSpec::new("a"),
                tag: "first",
            })
            .await;
        let returned = registry
            .register_agent(Fixed {
                spec: AgentSpec::new("a"),
                tag: "second",
            })
            .await;

        let out = returned.read().await.evaluate(&AgentInputs::new()).await.unwrap();
        assert_eq!(out["tag"], json!("first"));

        let looked_up = registry.get_agent("a").await.unwrap();
        let out = looked_up.read().await.evaluate(&AgentInputs::new()).await.unwrap();
        assert_eq!(out["tag"], json!("first"));
        assert_eq!(registry.agent_names().await, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_agent() {
        let registry = AgentRegistry::new();
        assert!(registry.get_agent("ghost").await.is_none());
        assert!(registry.agent_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_registering_agent_collects_callables_and_tools() {
        let registry = AgentRegistry::new();
        let spec = AgentSpec::new("router")
            .with_tool(Arc::new(Echo))
            .with_hand_off(HandOffCallable::new("route", |_, _| Ok(None)));
        registry.register_agent(Fixed { spec, tag: "x" }).await;

        let table = registry.callables().await;
        assert!(table.hand_off("route").is_ok());
        assert!(registry.get_tool("echo").await.is_some());
    }
}
