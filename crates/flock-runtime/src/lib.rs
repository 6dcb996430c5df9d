// =============================================================================
// Flock Runtime - Chain Execution and Orchestration
// =============================================================================
//
// Main Components:
// - AgentRegistry: agents, tools and callables by name
// - ExecutionEngine: drives one agent chain over a FlockContext
// - workflow: the JSON activity boundary with local and workflow executors
// - Flock: the front door that registers agents and starts runs
//
// =============================================================================

pub mod engine;
pub mod error;
pub mod flock;
pub mod logging;
pub mod prompt;
pub mod registry;
pub mod retry;
pub mod workflow;

pub use engine::{ChainError, ChainErrorKind, ChainOptions, ChainResult, ExecutionEngine};
pub use error::{FlockError, FlockResult};
pub use flock::{AgentRef, Flock};
pub use logging::init_logging;
pub use prompt::{InputPrompter, StdinPrompter};
pub use registry::{AgentRegistry, SharedAgent};
pub use retry::{RetryConfig, retry_with_policy};

// Kernel types needed to drive a chain
pub use flock_kernel::agent::{Agent, AgentInputs, AgentOutputs};
pub use flock_kernel::config::FlockConfig;
pub use flock_kernel::context::FlockContext;
