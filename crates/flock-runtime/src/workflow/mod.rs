//! 持久化工作流边界
//! Durable-workflow boundary
//!
//! A chain crosses this boundary as JSON: the context is serialized, handed to
//! an [`ActivityRunner`], and the outcome comes back as an [`ActivityOutcome`]
//! envelope tagged by `status`.

mod activity;
mod executor;

pub use activity::{
    ActivityError, ActivityOutcome, ActivityRunner, LocalActivityRunner, run_agent_activity,
};
pub use executor::{ChainExecutor, LocalExecutor, WorkflowExecutor};
