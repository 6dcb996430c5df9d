//! Flock 内核
//! Flock kernel
//!
//! Context store, input resolution and the declarative agent contract shared
//! by the foundation agents and the runtime chain engine.

// context module
pub mod context;

// input resolution
pub mod resolver;

// Declarative agent framework (声明式 Agent 框架)
pub mod agent;

// config module
pub mod config;

pub use agent::{Agent, AgentError, AgentInputs, AgentOutputs, AgentResult, AgentSpec};
pub use context::{ContextError, ContextResult, FlockContext};
