//! Reserved context variables.
//!
//! Every key lives in the `flock.` namespace so it cannot collide with the
//! `<agent>.<output>` keys written by [`FlockContext::record`](super::FlockContext::record).

/// Namespace prefix for top-level inputs and reserved variables.
pub const FLOCK_NAMESPACE: &str = "flock";

/// Name of the agent the chain driver is about to run.
pub const FLOCK_CURRENT_AGENT: &str = "flock.current_agent";

/// The input mapping the chain was started with.
pub const FLOCK_INITIAL_INPUT: &str = "flock.initial_input";

/// Whether the chain runs in-process instead of through the workflow engine.
pub const FLOCK_LOCAL_DEBUG: &str = "flock.local_debug";

/// Run identifier of the current chain.
pub const FLOCK_RUN_ID: &str = "flock.run_id";

/// Name of the agent recorded most recently.
pub const FLOCK_LAST_AGENT: &str = "flock.last_agent";

/// Output mapping recorded most recently.
pub const FLOCK_LAST_RESULT: &str = "flock.last_result";

/// Workflow outcome, written as `{"result": .., "success": bool}`.
pub const FLOCK_RESULT: &str = "flock.result";

/// Key under which a top-level input is stored, e.g. `flock.blog_idea`.
pub fn input_key(key: &str) -> String {
    format!("{FLOCK_NAMESPACE}.{key}")
}

/// Strips a leading `flock.` from an input-spec key.
pub fn strip_namespace(key: &str) -> &str {
    key.strip_prefix("flock.").unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_key_roundtrip() {
        assert_eq!(input_key("blog_idea"), "flock.blog_idea");
        assert_eq!(strip_namespace("flock.blog_idea"), "blog_idea");
        assert_eq!(strip_namespace("blog_idea"), "blog_idea");
    }
}
