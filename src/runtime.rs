//! Convenience entry point for callers who just want to run a task and get
//! a value back, without constructing a `TaskLoop` or a `StateHandle`
//! themselves.
//!
//! `Runtime` does not add behavior beyond what `TaskLoop` already has; it
//! picks sensible defaults (no persistence, no event handler) and forwards
//! through the unified [`crate::Error`].

use std::sync::Arc;

use agentrt_agent::{Agent, Event, EventHandler, EventLog, TaskInput, TaskLoop};
use agentrt_core::Value;
use agentrt_store::StateHandle;

use crate::error::Error;

/// Runs agent tasks with a chosen persistence mode and an optional shared
/// event handler.
///
/// Cheap to construct; holds no state of its own beyond its configuration,
/// mirroring `TaskLoop`'s own statelessness.
pub struct Runtime {
    state: StateHandle,
    handler: Option<Arc<dyn EventHandler>>,
}

impl Runtime {
    /// A runtime with no persistence (`StateHandle::None`) and no event
    /// handler — fire-and-forget task execution.
    pub fn new() -> Self {
        Self {
            state: StateHandle::None,
            handler: None,
        }
    }

    /// Run tasks against an existing store handle instead of the default
    /// no-persistence mode (e.g. a `VersionedSession` or `LiveStore`
    /// wrapped in a `StateHandle`).
    pub fn with_state(state: StateHandle) -> Self {
        Self { state, handler: None }
    }

    /// Attach an event handler that observes every event this runtime's
    /// task invocations emit.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Run one top-level task to completion, returning its success value
    /// and the event log recording the invocation (and any sub-agent calls
    /// it made).
    pub fn run_task(&self, agent: Arc<Agent>, input: TaskInput) -> crate::Result<(Value, Arc<EventLog>)> {
        let task_loop = TaskLoop::new(agent);
        task_loop
            .run_task(input, self.state.clone(), self.handler.clone())
            .map_err(Error::from)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// An [`EventHandler`] that simply logs events via `tracing`, useful as a
/// default when a caller wants visibility without writing its own handler.
pub struct TracingEventHandler;

impl EventHandler for TracingEventHandler {
    fn on_event(&self, event: &Event) {
        tracing::debug!(kind = ?event.kind, agent = %event.agent_name, "agent event");
    }
}
