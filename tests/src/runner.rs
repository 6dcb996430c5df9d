use async_trait::async_trait;
use flock_runtime::workflow::{ActivityError, ActivityRunner};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// An activity runner that replays scripted outcomes.
///
/// Each call pops the next scripted outcome. Once the script is exhausted,
/// calls go to the delegate runner if one is set, else fail as unavailable.
/// Every payload is recorded.
#[derive(Default)]
pub struct MockActivityRunner {
    script: Mutex<VecDeque<Result<Value, ActivityError>>>,
    delegate: Option<Arc<dyn ActivityRunner>>,
    payloads: Mutex<Vec<Value>>,
}

impl MockActivityRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, outcome: Result<Value, ActivityError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
        self
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn ActivityRunner>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Context payloads received, oldest first.
    pub fn payloads(&self) -> Vec<Value> {
        self.payloads
            .lock()
            .map(|payloads| payloads.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.payloads.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ActivityRunner for MockActivityRunner {
    async fn run_activity(&self, activity_id: &str, context: Value) -> Result<Value, ActivityError> {
        if let Ok(mut payloads) = self.payloads.lock() {
            payloads.push(context.clone());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        if let Some(outcome) = scripted {
            debug!(activity_id, "Replaying scripted activity outcome");
            return outcome;
        }

        match &self.delegate {
            Some(delegate) => delegate.run_activity(activity_id, context).await,
            None => Err(ActivityError::Unavailable("no scripted outcome left".to_string())),
        }
    }
}
