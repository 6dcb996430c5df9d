use async_trait::async_trait;
use flock_runtime::{FlockError, FlockResult, InputPrompter};
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers input prompts from a fixed table and records every question.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: HashMap<String, String>,
    asked: Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, key: &str, answer: &str) -> Self {
        self.answers.insert(key.to_string(), answer.to_string());
        self
    }

    /// `(agent, key)` pairs in the order they were asked.
    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked
            .lock()
            .map(|asked| asked.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl InputPrompter for ScriptedPrompter {
    async fn prompt(&self, agent: &str, key: &str) -> FlockResult<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push((agent.to_string(), key.to_string()));
        }
        self.answers
            .get(key)
            .cloned()
            .ok_or_else(|| FlockError::Prompt(format!("no scripted answer for '{key}'")))
    }
}
