//! 编排器入口
//! Orchestrator front door
//!
//! [`Flock`] owns the registry, the live context and the configuration. It
//! registers agents, seeds the context for a run and hands it to the local or
//! the workflow executor.

use crate::engine::{ChainOptions, ExecutionEngine};
use crate::error::{FlockError, FlockResult};
use crate::prompt::{InputPrompter, StdinPrompter};
use crate::registry::{AgentRegistry, SharedAgent};
use crate::workflow::{
    ActivityRunner, ChainExecutor, LocalActivityRunner, LocalExecutor, WorkflowExecutor,
};
use flock_kernel::agent::{Agent, AgentInputs, AgentOutputs, SharedTool, SpecValue};
use flock_kernel::config::FlockConfig;
use flock_kernel::context::{FlockContext, strip_namespace};
use flock_kernel::resolver::top_level_to_keys;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// 起始 Agent 引用
/// Start agent, by name or by handle
#[derive(Clone)]
pub enum AgentRef {
    Name(String),
    Agent(SharedAgent),
}

impl From<&str> for AgentRef {
    fn from(name: &str) -> Self {
        AgentRef::Name(name.to_string())
    }
}

impl From<String> for AgentRef {
    fn from(name: String) -> Self {
        AgentRef::Name(name)
    }
}

impl From<SharedAgent> for AgentRef {
    fn from(agent: SharedAgent) -> Self {
        AgentRef::Agent(agent)
    }
}

/// 编排器
/// Orchestrator
pub struct Flock {
    config: FlockConfig,
    registry: Arc<AgentRegistry>,
    context: FlockContext,
    prompter: Arc<dyn InputPrompter>,
    activity_runner: Option<Arc<dyn ActivityRunner>>,
}

impl Flock {
    pub fn new(config: FlockConfig) -> Self {
        Self {
            config,
            registry: Arc::new(AgentRegistry::new()),
            context: FlockContext::new(),
            prompter: Arc::new(StdinPrompter),
            activity_runner: None,
        }
    }

    /// 从配置文件创建
    /// Create from an optional config file plus `FLOCK_*` overrides
    pub fn load(path: Option<&Path>) -> FlockResult<Self> {
        Ok(Self::new(FlockConfig::load(path)?))
    }

    pub fn with_registry(mut self, registry: Arc<AgentRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_prompter(mut self, prompter: Arc<dyn InputPrompter>) -> Self {
        self.prompter = prompter;
        self
    }

    /// 设置工作流活动执行器，默认进程内执行
    /// Runner used by the workflow executor; defaults to [`LocalActivityRunner`]
    pub fn with_activity_runner(mut self, runner: Arc<dyn ActivityRunner>) -> Self {
        self.activity_runner = Some(runner);
        self
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn context(&self) -> &FlockContext {
        &self.context
    }

    // ========================================================================
    // 注册
    // ========================================================================

    /// 添加 Agent
    /// Add an agent.
    ///
    /// Fills in the default model when the agent names none. If an agent with
    /// the same name exists, that one is returned and `agent` is dropped.
    pub async fn add_agent<A: Agent>(&mut self, mut agent: A) -> SharedAgent {
        if agent.spec().model.is_none() {
            agent.spec_mut().model = Some(self.config.default_model.clone());
        }

        let name = agent.name().to_string();
        if let Some(existing) = self.registry.get_agent(&name).await {
            warn!(agent = %name, "Agent already exists, returning existing instance");
            return existing;
        }

        let agent_type = agent.agent_type_name().to_string();
        let data = agent.to_dict();
        let shared = self.registry.register_agent(agent).await;
        self.context.add_agent_definition(agent_type, name.clone(), data);
        info!(agent = %name, "Agent added");
        shared
    }

    /// 添加工具
    pub async fn add_tool(&self, tool: SharedTool) {
        info!(tool = %tool.name(), "Tool added");
        self.registry.register_tool(tool).await;
    }

    // ========================================================================
    // 运行
    // ========================================================================

    /// 运行代理链
    /// Run a chain from `start`.
    ///
    /// `context` replaces the live context when given. Missing start inputs
    /// are requested from the prompter. The run id defaults to
    /// `"<agent>_<4 hex>"`.
    pub async fn run(
        &mut self,
        start: impl Into<AgentRef>,
        input: AgentInputs,
        context: Option<FlockContext>,
        run_id: Option<String>,
    ) -> FlockResult<AgentOutputs> {
        let start_agent = self.resolve_start(start.into()).await?;
        let (name, input_spec) = {
            let guard = start_agent.read().await;
            (guard.name().to_string(), guard.spec().input.clone())
        };

        if let Some(context) = context {
            self.context = context;
        }

        let run_id = run_id.unwrap_or_else(|| generate_run_id(&name));
        let span = info_span!("flock.run", agent = %name, run_id = %run_id);

        self.run_seeded(&name, &input_spec, input, &run_id)
            .instrument(span)
            .await
    }

    async fn run_seeded(
        &mut self,
        name: &str,
        input_spec: &SpecValue,
        mut input: AgentInputs,
        run_id: &str,
    ) -> FlockResult<AgentOutputs> {
        for key in top_level_to_keys(&input_spec.resolve(&self.context)) {
            let key = strip_namespace(&key);
            if key.contains('.') || key.eq_ignore_ascii_case("context") || input.contains_key(key) {
                continue;
            }
            let value = self.prompter.prompt(name, key).await?;
            input.insert(key.to_string(), Value::String(value));
        }

        let local_debug = self.config.local_debug;
        self.context.initialize(name, &input, run_id, local_debug);
        info!(local_debug, "Starting chain");

        let executor = self.executor(local_debug);
        executor.execute(&mut self.context).await
    }

    async fn resolve_start(&mut self, start: AgentRef) -> FlockResult<SharedAgent> {
        match start {
            AgentRef::Name(name) => match self.registry.get_agent(&name).await {
                Some(agent) => Ok(agent),
                None => {
                    let available = self.registry.agent_names().await;
                    error!(agent = %name, available = ?available, "Start agent not registered");
                    Err(FlockError::AgentNotFound(name))
                }
            },
            AgentRef::Agent(agent) => {
                let (name, agent_type, data) = {
                    let guard = agent.read().await;
                    (
                        guard.name().to_string(),
                        guard.agent_type_name().to_string(),
                        guard.to_dict(),
                    )
                };
                if let Some(existing) = self.registry.get_agent(&name).await {
                    return Ok(existing);
                }
                info!(agent = %name, "Registering start agent");
                let shared = self.registry.register_shared(agent).await;
                self.context.add_agent_definition(agent_type, name, data);
                Ok(shared)
            }
        }
    }

    fn executor(&self, local_debug: bool) -> Box<dyn ChainExecutor> {
        let options = ChainOptions::from(&self.config.chain);
        if local_debug {
            let engine = ExecutionEngine::new(self.registry.clone()).with_options(options);
            return Box::new(LocalExecutor::new(engine));
        }

        let runner = match &self.activity_runner {
            Some(runner) => runner.clone(),
            None => Arc::new(LocalActivityRunner::new(self.registry.clone()).with_options(options)),
        };
        Box::new(WorkflowExecutor::new(runner, self.config.workflow.clone()))
    }
}

/// `"<agent>_<4 hex>"`
fn generate_run_id(agent: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{agent}_{}", &hex[..4])
}
