//! Flock Foundation
//!
//! Concrete agents built on the kernel contract:
//!
//! - [`DeclarativeAgent`](agent::DeclarativeAgent): the default LLM-backed agent
//! - [`BatchAgent`](agent::BatchAgent), [`LoopAgent`](agent::LoopAgent),
//!   [`TriggerAgent`](agent::TriggerAgent): wrappers changing how an agent is evaluated
//! - [`FnTool`](agent::tools::FnTool) / [`ClosureTool`](agent::tools::ClosureTool): tool adapters

pub mod agent;

pub use agent::{BatchAgent, DeclarativeAgent, LoopAgent, TriggerAgent};
