//! 具体 Agent 实现
//! Concrete agent implementations

pub mod batch;
pub mod declarative;
pub mod loop_agent;
pub mod tools;
pub mod trigger;

pub use batch::BatchAgent;
pub use declarative::DeclarativeAgent;
pub use loop_agent::LoopAgent;
pub use tools::{ClosureTool, FnTool};
pub use trigger::TriggerAgent;
