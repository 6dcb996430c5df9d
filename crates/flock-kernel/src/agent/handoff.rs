//! 交接描述
//! Hand-off descriptor

use super::types::AgentInputs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Describes the transition to the next agent of a chain.
///
/// `input` is merged over the next agent's resolved inputs. `context` holds
/// state variables written into the live context before that resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandOff {
    pub next_agent: String,
    #[serde(default)]
    pub input: AgentInputs,
    #[serde(default)]
    pub context: Option<HashMap<String, Value>>,
}

impl HandOff {
    pub fn to(next_agent: impl Into<String>) -> Self {
        Self {
            next_agent: next_agent.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.input.insert(key.into(), value);
        self
    }

    pub fn with_context_var(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}
