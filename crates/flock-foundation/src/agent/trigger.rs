//! 触发 Agent
//! Trigger agent
//!
//! Polls a trigger predicate every `check_interval` and evaluates the wrapped
//! agent once it fires. Gives up with [`AgentError::Timeout`] after `max_wait`.

use async_trait::async_trait;
use flock_kernel::agent::{
    Agent, AgentError, AgentInputs, AgentOutputs, AgentResult, AgentSpec, CallableEntry,
    TerminationCallable,
};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

pub struct TriggerAgent<A> {
    inner: A,
    trigger: TerminationCallable,
    check_interval: Duration,
    max_wait: Duration,
}

impl<A: Agent> TriggerAgent<A> {
    pub const TYPE_NAME: &'static str = "TriggerAgent";

    /// Defaults: check every second, wait at most a minute.
    pub fn new(inner: A, trigger: TerminationCallable) -> Self {
        Self {
            inner,
            trigger,
            check_interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(60),
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    async fn wait_for_trigger(&self, inputs: &AgentInputs) -> AgentResult<()> {
        let started = Instant::now();
        loop {
            if self.trigger.call(inputs) {
                debug!(agent = %self.name(), waited_ms = started.elapsed().as_millis() as u64, "Triggered");
                return Ok(());
            }
            if started.elapsed() >= self.max_wait {
                warn!(agent = %self.name(), "Trigger timeout");
                return Err(AgentError::timeout(self.max_wait.as_millis() as u64));
            }
            sleep(self.check_interval).await;
        }
    }
}

#[async_trait]
impl<A: Agent> Agent for TriggerAgent<A> {
    fn spec(&self) -> &AgentSpec {
        self.inner.spec()
    }

    fn spec_mut(&mut self) -> &mut AgentSpec {
        self.inner.spec_mut()
    }

    fn agent_type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    async fn evaluate(&self, inputs: &AgentInputs) -> AgentResult<AgentOutputs> {
        self.wait_for_trigger(inputs).await?;
        self.inner.evaluate(inputs).await
    }

    fn to_dict(&self) -> Value {
        let mut data = self.inner.to_dict();
        if let Some(obj) = data.as_object_mut() {
            obj.insert("trigger_condition".into(), self.trigger.to_reference());
            obj.insert(
                "check_interval_ms".into(),
                json!(self.check_interval.as_millis() as u64),
            );
            obj.insert("max_wait_ms".into(), json!(self.max_wait.as_millis() as u64));
        }
        data
    }

    fn callable_entries(&self) -> Vec<CallableEntry> {
        let mut entries = self.inner.callable_entries();
        entries.push(CallableEntry::Termination(self.trigger.clone()));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Fixed {
        spec: AgentSpec,
    }

    #[async_trait]
    impl Agent for Fixed {
        fn spec(&self) -> &AgentSpec {
            &self.spec
        }

        fn spec_mut(&mut self) -> &mut AgentSpec {
            &mut self.spec
        }

        fn agent_type_name(&self) -> &str {
            "Fixed"
        }

        async fn evaluate(&self, _inputs: &AgentInputs) -> AgentResult<AgentOutputs> {
            let mut out = AgentOutputs::new();
            out.insert("status".into(), json!("completed"));
            Ok(out)
        }
    }

    fn fixed() -> Fixed {
        Fixed {
            spec: AgentSpec::new("watcher").with_output("status"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_polling() {
        let checks = Arc::new(AtomicUsize::new(0));
        let checks_in = checks.clone();
        let trigger = TerminationCallable::new("third_check", move |_| {
            checks_in.fetch_add(1, Ordering::SeqCst) >= 2
        });
        let agent = TriggerAgent::new(fixed(), trigger)
            .with_check_interval(Duration::from_millis(100));

        let out = agent.run(AgentInputs::new()).await.unwrap();
        assert_eq!(out["status"], json!("completed"));
        assert_eq!(checks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let trigger = TerminationCallable::new("never", |_| false);
        let agent = TriggerAgent::new(fixed(), trigger)
            .with_check_interval(Duration::from_millis(250))
            .with_max_wait(Duration::from_secs(1));

        let err = agent.run(AgentInputs::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout { duration_ms: 1000 }));
    }

    #[tokio::test]
    async fn test_trigger_can_observe_external_state() {
        let flag = Arc::new(AtomicBool::new(true));
        let flag_in = flag.clone();
        let trigger = TerminationCallable::new("flag", move |_| flag_in.load(Ordering::SeqCst));
        let agent = TriggerAgent::new(fixed(), trigger);

        assert!(agent.run(AgentInputs::new()).await.is_ok());
        assert_eq!(agent.callable_entries().len(), 1);
        assert_eq!(agent.to_dict()["trigger_condition"], json!({"callable": "flag"}));
    }
}
