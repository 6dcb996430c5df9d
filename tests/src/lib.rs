//! Flock Testing Framework
//!
//! Provides test doubles for evaluators, tools, input prompts and the
//! workflow activity runner, so agent chains can be exercised without live
//! LLM calls or a workflow service.

pub mod evaluator;
pub mod prompter;
pub mod runner;
pub mod tools;

pub use evaluator::MockEvaluator;
pub use prompter::ScriptedPrompter;
pub use runner::MockActivityRunner;
pub use tools::MockTool;
