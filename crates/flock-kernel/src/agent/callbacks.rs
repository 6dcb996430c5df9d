//! 生命周期回调
//! Lifecycle callbacks
//!
//! A callback present here takes precedence over the matching [`Agent`](super::Agent)
//! hook implementation.

use super::callable::{CallableEntry, ErrorCallable, InitializeCallable, TerminateCallable};
use super::error::{AgentError, AgentResult};
use super::types::{AgentInputs, AgentOutputs};

#[derive(Debug, Clone, Default)]
pub struct AgentCallbacks {
    pub initialize: Option<InitializeCallable>,
    pub terminate: Option<TerminateCallable>,
    pub on_error: Option<ErrorCallable>,
}

impl AgentCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initialize(
        mut self,
        label: impl Into<String>,
        func: impl Fn(&str, AgentInputs) -> AgentResult<AgentInputs> + Send + Sync + 'static,
    ) -> Self {
        self.initialize = Some(InitializeCallable::new(label, func));
        self
    }

    pub fn with_terminate(
        mut self,
        label: impl Into<String>,
        func: impl Fn(&str, &AgentInputs, &AgentOutputs) -> AgentResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.terminate = Some(TerminateCallable::new(label, func));
        self
    }

    pub fn with_on_error(
        mut self,
        label: impl Into<String>,
        func: impl Fn(&str, &AgentError, &AgentInputs) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(ErrorCallable::new(label, func));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.initialize.is_none() && self.terminate.is_none() && self.on_error.is_none()
    }

    /// Registered callables, for a [`CallableTable`](super::CallableTable).
    pub fn entries(&self) -> Vec<CallableEntry> {
        let mut entries = Vec::new();
        if let Some(c) = &self.initialize {
            entries.push(CallableEntry::Initialize(c.clone()));
        }
        if let Some(c) = &self.terminate {
            entries.push(CallableEntry::Terminate(c.clone()));
        }
        if let Some(c) = &self.on_error {
            entries.push(CallableEntry::OnError(c.clone()));
        }
        entries
    }
}
