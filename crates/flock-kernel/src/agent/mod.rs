//! 声明式 Agent 框架
//! Declarative agent framework
//!
//! - [`AgentSpec`]: what an agent reads and writes, and where the chain goes next
//! - [`Agent`]: the lifecycle contract driven by the chain engine
//! - [`Evaluator`] / [`Tool`]: seams to the LLM library and tool implementations
//! - [`CallableTable`]: labeled functions restored after serialization

pub mod callable;
pub mod callbacks;
pub mod core;
pub mod error;
pub mod evaluator;
pub mod handoff;
pub mod spec;
pub mod tool;
pub mod types;

pub use callable::{
    CallableEntry, CallableTable, ErrorCallable, HandOffCallable, InitializeCallable,
    SpecCallable, TerminateCallable, TerminationCallable,
};
pub use callbacks::AgentCallbacks;
pub use core::Agent;
pub use error::{AgentError, AgentResult};
pub use evaluator::{EvaluationRequest, Evaluator};
pub use handoff::HandOff;
pub use spec::{AgentConfig, AgentSpec, DEFAULT_MODEL, HandOffRule, SpecValue, Termination};
pub use tool::{SharedTool, Tool};
pub use types::{AgentInputs, AgentOutputs, AgentType};
