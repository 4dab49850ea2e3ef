//! The Agent Task Loop: the bounded think-act iteration
//! driver that renders context, calls the oracle, parses and executes the
//! returned code fragment, snapshots state, and records events until a
//! terminal signal is reached or `max_iterations` is exhausted.

use std::sync::Arc;
use std::time::Duration;

use agentrt_core::{Namespace, TaskId, Timestamp, Value};
use agentrt_render::{render, Message, RenderEvent, TaskSignature};
use agentrt_sandbox::{parse, EvalError, Interpreter, OutputPayload, Signal};
use agentrt_store::StateHandle;
use indexmap::IndexMap;

use crate::agent::Agent;
use crate::dispatch;
use crate::error::AgentError;
use crate::event::{Event, EventKind};
use crate::handler::{self, EventHandler};
use crate::log::EventLog;
use crate::oracle::OracleError;

/// One task invocation's actual call payload: positional/named arguments
/// and (for sub-agent dispatches) the parent task lineage. Distinct from
/// [`crate::task::Task`], which is the *declared* shape of a task rather
/// than one specific call's values.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub name: String,
    pub args: Vec<(String, Value)>,
    pub return_type: Option<String>,
    pub parent_task: Option<TaskId>,
}

impl TaskInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            return_type: None,
            parent_task: None,
        }
    }

    /// Build a call from positional values only, named `arg0`, `arg1`,...
    /// (used for sub-agent dispatch, where the registered function's
    /// signature is `name(*args)`).
    pub fn positional(name: impl Into<String>, values: Vec<Value>) -> Self {
        let args = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("arg{i}"), v))
            .collect();
        Self {
            name: name.into(),
            args,
            return_type: None,
            parent_task: None,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.push((name.into(), value));
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent_task = Some(parent);
        self
    }
}

/// Drives one agent's think-act loop to a terminal signal.
///
/// Stateless beyond the [`Agent`] handle it wraps: every call to [`run`]
/// (or the top-level convenience [`run_task`]) is an independent task
/// invocation. A `TaskLoop` is cheap to construct and is what sub-agent
/// dispatch (`agentrt_agent::dispatch`) builds fresh for every recursive
/// call.
pub struct TaskLoop {
    agent: Arc<Agent>,
}

impl TaskLoop {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// Top-level task invocation: a fresh namespace rooted at the agent's
    /// own name and a fresh event log.
    ///
    /// Returns the task's success value alongside the event log recording
    /// everything this invocation (and any sub-agent calls it made)
    /// emitted.
    pub fn run_task(
        &self,
        input: TaskInput,
        state: StateHandle,
        handler: Option<Arc<dyn EventHandler>>,
    ) -> Result<(Value, Arc<EventLog>), AgentError> {
        let namespace = Namespace::for_agent(&self.agent.name);
        let event_log = Arc::new(EventLog::new());
        let value = self.run(input, state, namespace, event_log.clone(), handler)?;
        Ok((value, event_log))
    }

    /// The core loop driver, shared by top-level
    /// invocations and sub-agent dispatch recursion
    /// (`agentrt_agent::dispatch::bind_agent`).
    pub fn run(
        &self,
        input: TaskInput,
        state: StateHandle,
        namespace: Namespace,
        event_log: Arc<EventLog>,
        handler: Option<Arc<dyn EventHandler>>,
    ) -> Result<Value, AgentError> {
        let task_id = TaskId::new();
        let handler_ref = handler.as_deref();

        self.push(
            &event_log,
            handler_ref,
            EventKind::TaskStart,
            &namespace,
            None,
            args_value(&input.args),
        );

        let task_sig = TaskSignature {
            name: input.name.clone(),
            args: input.args.clone(),
            return_type: input.return_type.clone(),
        };
        let mut render_events: Vec<RenderEvent> = Vec::new();
        let timeout = Duration::from_secs_f64(self.agent.config.timeout_seconds);

        for _iteration in 0..self.agent.config.max_iterations {
            let messages = render(
                self.agent.primer.as_deref(),
                &self.agent.registry,
                &render_events,
                &task_sig,
                self.agent.config.max_tokens,
            );

            let (_thinking, code) = self.call_oracle(&messages)?;

            let block = match parse(&code) {
                Ok(block) => block,
                Err(e) => {
                    let ev = self.push(
                        &event_log,
                        handler_ref,
                        EventKind::Output,
                        &namespace,
                        None,
                        Value::Str(format!("parse error: {e}")),
                    );
                    render_events.push(ev.render_view());
                    continue;
                }
            };

            let action_ts = Timestamp::tick();
            let interp = Interpreter::new(
                &self.agent.registry,
                state.clone(),
                namespace.clone(),
                timeout,
                input.return_type.clone(),
            );

            let guard = dispatch::install(dispatch::DispatchContext {
                    state: state.clone(),
                    namespace: namespace.clone(),
                    event_log: event_log.clone(),
                    handler: handler.clone(),
                    parent_task: task_id,
            });
            let run_result = interp.run(&block);
            drop(guard);

            match run_result {
                Ok(outcome) => {
                    let action_event = Event {
                        kind: EventKind::Action,
                        timestamp: action_ts,
                        agent_name: self.agent.name.clone(),
                        namespace: namespace.clone(),
                        commit_hash: outcome.commit_hash,
                        payload: Value::Str(code.clone()),
                    };
                    self.emit(&event_log, handler_ref, action_event.clone());
                    render_events.push(action_event.render_view());

                    for output in &outcome.outputs {
                        let payload = match output {
                            OutputPayload::Text(t) => Value::Str(t.clone()),
                            OutputPayload::Value(v) => v.clone(),
                        };
                        let ev = self.push(
                            &event_log,
                            handler_ref,
                            EventKind::Output,
                            &namespace,
                            outcome.commit_hash,
                            payload,
                        );
                        render_events.push(ev.render_view());
                    }

                    match outcome.signal {
                        Some(Signal::Success(value)) => {
                            self.push(
                                &event_log,
                                handler_ref,
                                EventKind::Success,
                                &namespace,
                                outcome.commit_hash,
                                value.clone(),
                            );
                            return Ok(value);
                        }
                        Some(Signal::Fail(message)) => {
                            self.push(
                                &event_log,
                                handler_ref,
                                EventKind::Fail,
                                &namespace,
                                outcome.commit_hash,
                                Value::Str(message.clone()),
                            );
                            return Err(AgentError::TaskFail { message });
                        }
                        Some(Signal::Clarify(message)) => {
                            self.push(
                                &event_log,
                                handler_ref,
                                EventKind::Clarify,
                                &namespace,
                                outcome.commit_hash,
                                Value::Str(message.clone()),
                            );
                            return Err(AgentError::TaskClarify { message });
                        }
                        Some(Signal::Continue(observations)) => {
                            let ev = self.push(
                                &event_log,
                                handler_ref,
                                EventKind::Output,
                                &namespace,
                                outcome.commit_hash,
                                Value::Array(observations),
                            );
                            render_events.push(ev.render_view());
                        }
                        None => {}
                    }
                }
                Err(eval_err) => {
                    // A turn that errors mid-fragment produces no commit:
                    // the overlay is discarded, but the action attempted and the reason it
                    // failed are still recorded so the agent can retry.
                    let action_event = Event {
                        kind: EventKind::Action,
                        timestamp: action_ts,
                        agent_name: self.agent.name.clone(),
                        namespace: namespace.clone(),
                        commit_hash: None,
                        payload: Value::Str(code.clone()),
                    };
                    self.emit(&event_log, handler_ref, action_event.clone());
                    render_events.push(action_event.render_view());

                    let message = describe_eval_error(eval_err);
                    let ev = self.push(&event_log, handler_ref, EventKind::Output, &namespace, None, Value::Str(message));
                    render_events.push(ev.render_view());
                }
            }
        }

        self.push(
            &event_log,
            handler_ref,
            EventKind::Output,
            &namespace,
            None,
            Value::Str("max_iterations exhausted without a terminal signal".to_string()),
        );
        Err(AgentError::TaskTimeout {
                max_iterations: self.agent.config.max_iterations,
        })
    }

    /// Call the oracle, retrying transport/format failures up to
    /// `llm_max_retries` times with exponential backoff.
    fn call_oracle(&self, messages: &[Message]) -> Result<(String, String), AgentError> {
        let mut attempt = 0usize;
        let mut last_err: Option<OracleError> = None;
        loop {
            match self.agent.oracle.complete(messages) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt >= self.agent.config.llm_max_retries {
                        last_err = Some(e);
                        break;
                    }
                    let backoff = self.agent.config.llm_retry_backoff * 2f64.powi(attempt as i32);
                    if backoff > 0.0 {
                        std::thread::sleep(Duration::from_secs_f64(backoff));
                    }
                    last_err = Some(e);
                    attempt += 1;
                }
            }
        }
        Err(AgentError::LLMFailure {
                attempts: attempt + 1,
                message: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    fn push(
        &self,
        event_log: &EventLog,
        handler: Option<&dyn EventHandler>,
        kind: EventKind,
        namespace: &Namespace,
        commit_hash: Option<agentrt_core::CommitHash>,
        payload: Value,
    ) -> Event {
        let event = Event {
            kind,
            timestamp: Timestamp::tick(),
            agent_name: self.agent.name.clone(),
            namespace: namespace.clone(),
            commit_hash,
            payload,
        };
        self.emit(event_log, handler, event.clone());
        event
    }

    fn emit(&self, event_log: &EventLog, handler: Option<&dyn EventHandler>, event: Event) {
        handler::dispatch(handler, &event);
        event_log.append(event);
    }
}

fn args_value(args: &[(String, Value)]) -> Value {
    let mut map = IndexMap::new();
    for (name, value) in args {
        map.insert(name.clone(), value.clone());
    }
    Value::Map(map)
}

/// Render a non-terminal evaluation failure as the observation text the
/// agent sees.
fn describe_eval_error(err: EvalError) -> String {
    match err {
        EvalError::Sandbox(e) => e.to_string(),
        // A terminal signal can only unwind out of `Interpreter::run` via
        // its `Ok` path (see `eval::Interpreter::run`); this arm exists so
        // the match stays exhaustive against future `EvalError` variants.
        EvalError::Signal(_) => "unexpected unhandled task signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::oracle::Oracle;
    use agentrt_registry::Registry;
    use agentrt_store::VersionedSession;
    use agentrt_kv::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

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

    fn agent_with_scripts(scripts: Vec<(&'static str, &'static str)>) -> Arc<Agent> {
        let config = AgentConfig::builder().max_iterations(5).build();
        Agent::new(
            "tester",
            config,
            Registry::new(),
            Arc::new(ScriptedOracle {
                    scripts,
                    calls: AtomicUsize::new(0),
            }),
        )
    }

    fn versioned_state() -> StateHandle {
        let backing = agentrt_store::VersionedStore::new(Arc::new(MemoryStore::default())).unwrap();
        StateHandle::Versioned(Arc::new(VersionedSession::new(Arc::new(backing))))
    }

    #[test]
    fn basic_success_returns_after_one_iteration() {
        let agent = agent_with_scripts(vec![("compute", "task_success(25)")]);
        let loop_ = TaskLoop::new(agent);
        let (value, log) = loop_
            .run_task(TaskInput::new("compute"), StateHandle::None, None)
            .unwrap();
        assert_eq!(value, Value::Int(25));
        assert!(log.len() >= 2); // task-start + success at minimum
    }

    #[test]
    fn parse_error_is_non_terminal_and_retries() {
        let agent = agent_with_scripts(vec![("oops", "this is not valid syntax !!!"), ("fixed", "task_success(1)")]);
        let loop_ = TaskLoop::new(agent);
        let (value, _log) = loop_
            .run_task(TaskInput::new("t"), StateHandle::None, None)
            .unwrap();
        assert_eq!(value, Value::Int(1));
    }

    #[test]
    fn task_fail_surfaces_as_typed_error() {
        let agent = agent_with_scripts(vec![("giving up", "task_fail(\"cannot do this\")")]);
        let loop_ = TaskLoop::new(agent);
        let err = loop_
            .run_task(TaskInput::new("t"), StateHandle::None, None)
            .unwrap_err();
        assert!(matches!(err, AgentError::TaskFail {.. }));
    }

    #[test]
    fn task_clarify_surfaces_as_typed_error() {
        let agent = agent_with_scripts(vec![("need info", "task_clarify(\"which value?\")")]);
        let loop_ = TaskLoop::new(agent);
        let err = loop_
            .run_task(TaskInput::new("t"), StateHandle::None, None)
            .unwrap_err();
        assert!(matches!(err, AgentError::TaskClarify {.. }));
    }

    #[test]
    fn exhausting_max_iterations_raises_task_timeout() {
        let agent = agent_with_scripts(vec![("thinking", "x = 1"); 10]);
        let loop_ = TaskLoop::new(agent);
        let err = loop_
            .run_task(TaskInput::new("t"), StateHandle::None, None)
            .unwrap_err();
        assert!(matches!(err, AgentError::TaskTimeout {.. }));
    }

    #[test]
    fn mutation_persists_across_turns_in_versioned_mode() {
        let agent = agent_with_scripts(vec![
                ("turn 1", "xs = [1, 2]\nxs.append(3)\ntask_continue()"),
                ("turn 2", "task_success(xs)"),
        ]);
        let loop_ = TaskLoop::new(agent);
        let (value, _log) = loop_.run_task(TaskInput::new("t"), versioned_state(), None).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn closure_freezes_captured_name_across_turns() {
        let agent = agent_with_scripts(vec![
                ("define", "n = 2\ndef f(x):\n return x * n\ntask_continue()"),
                ("reassign and call", "n = 10\nprint(f(5))\ntask_success(None)"),
        ]);
        let loop_ = TaskLoop::new(agent);
        let (_value, log) = loop_.run_task(TaskInput::new("t"), versioned_state(), None).unwrap();
        let printed = log
            .all()
            .into_iter()
            .find(|e| e.kind == EventKind::Output && matches!(&e.payload, Value::Str(s) if s == "10"));
        assert!(printed.is_some(), "expected f(5) to observe the frozen n=2, printing 10");
    }
}
