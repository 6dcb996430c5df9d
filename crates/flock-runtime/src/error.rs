//! 运行时错误
//! Runtime error types

use crate::engine::ChainError;
use crate::workflow::ActivityError;
use flock_kernel::agent::AgentError;
use flock_kernel::config::ConfigError;
use flock_kernel::context::ContextError;
use thiserror::Error;

/// 编排器结果类型
pub type FlockResult<T> = Result<T, FlockError>;

/// 编排器错误
/// Orchestrator error
#[derive(Debug, Error)]
pub enum FlockError {
    #[error("Agent '{0}' not found.")]
    AgentNotFound(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Workflow activity failed: {0}")]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Input prompt failed: {0}")]
    Prompt(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl FlockError {
    /// 链错误 (如有)
    /// The chain failure behind this error, if any
    pub fn as_chain_error(&self) -> Option<&ChainError> {
        match self {
            FlockError::Chain(e) | FlockError::Activity(ActivityError::Chain(e)) => Some(e),
            _ => None,
        }
    }
}
