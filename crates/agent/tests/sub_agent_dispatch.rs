//! End-to-end sub-agent dispatch: a parent agent
//! calls a bound child agent from sandbox code, the child runs its own
//! task loop to a terminal signal, and both agents' events land on the
//! same shared event log with monotonically increasing timestamps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agentrt_agent::{bind_agent, Agent, AgentConfig, EventKind, Oracle, OracleError, TaskInput, TaskLoop};
use agentrt_core::Value;
use agentrt_render::Message;
use agentrt_registry::Registry;
use agentrt_store::StateHandle;

struct ScriptedOracle {
    scripts: Vec<(&'static str, &'static str)>,
    calls: AtomicUsize,
}

impl Oracle for ScriptedOracle {
    fn complete(&self, _messages: &[Message]) -> Result<(String, String), OracleError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        let (thinking, code) = self.scripts.get(i).copied().unwrap_or(("done", "pass"));
        Ok((thinking.to_string(), code.to_string()))
    }
}

fn scripted(scripts: Vec<(&'static str, &'static str)>) -> Arc<dyn Oracle> {
    Arc::new(ScriptedOracle {
            scripts,
            calls: AtomicUsize::new(0),
    })
}

#[test]
fn parent_task_dispatches_to_a_bound_sub_agent_and_shares_one_event_log() {
    let child = Agent::new(
        "summarizer",
        AgentConfig::builder().max_iterations(3).build(),
        Registry::new(),
        scripted(vec![("summarize", "task_success(\"a summary\")")]),
    );

    let mut parent_registry = Registry::new();
    bind_agent(&mut parent_registry, "summarize", child);

    let parent = Agent::new(
        "orchestrator",
        AgentConfig::builder().max_iterations(3).build(),
        parent_registry,
        scripted(vec![("delegate", "result = summarize()\ntask_success(result)")]),
    );

    let task_loop = TaskLoop::new(parent);
    let (value, log) = task_loop
        .run_task(TaskInput::new("produce_report"), StateHandle::None, None)
        .unwrap();

    assert_eq!(value, Value::Str("a summary".to_string()));

    let events = log.all();
    let task_starts = events.iter().filter(|e| e.kind == EventKind::TaskStart).count();
    assert_eq!(task_starts, 2, "expected one task-start for the parent and one for the child");

    let timestamps: Vec<u64> = events.iter().map(|e| e.timestamp.raw()).collect();
    let mut sorted = timestamps.clone();
    sorted.sort_unstable();
    assert_eq!(timestamps, sorted, "events must be recorded in monotonically increasing timestamp order");

    let success_count = events.iter().filter(|e| e.kind == EventKind::Success).count();
    assert_eq!(success_count, 2, "both parent and child reach their own task_success");
}

#[test]
fn sub_agent_call_outside_a_task_loop_turn_is_a_registry_error() {
    use agentrt_registry::{FunctionEntry, RegistryError};

    let mut registry = Registry::new();
    let child = Agent::new(
        "helper",
        AgentConfig::builder().max_iterations(1).build(),
        Registry::new(),
        scripted(vec![("x", "task_success(1)")]),
    );
    bind_agent(&mut registry, "helper", child);

    let entry: &FunctionEntry = registry
        .function("helper")
        .expect("helper should be registered as a function");
    let err = entry.call(&[]).unwrap_err();
    assert!(matches!(err, RegistryError::HostCallFailed {.. }));
}
