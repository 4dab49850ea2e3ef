//! Sub-agent dispatch.
//!
//! A bound sub-agent is exposed to sandbox code as an ordinary registered
//! function (`agentrt_registry::FunctionEntry`): a call to it looks, from
//! the sandbox's point of view, exactly like a call to any other host
//! function. What makes it a sub-agent call rather than a plain host call
//! is what the closure does when invoked — it reads the ambient turn
//! context (the parent's state handle, event log, handler, and namespace)
//! off a thread-local slot that [`TaskLoop::run`] installs for the
//! duration of a single code fragment's evaluation, then recurses into the
//! child agent's own `TaskLoop::run` under a child namespace.
//!
//! A thread-local is the right tool here rather than threading an extra
//! parameter down through every `HostFn` call site: the execution model is
//! single-threaded cooperative per task —
//! exactly one turn's sandbox evaluation is in flight on a given thread at
//! a time, so "the context currently installed on this thread" and "the
//! context for the turn calling this host function" are one and the same.

use std::cell::RefCell;
use std::sync::Arc;

use agentrt_core::{Namespace, TaskId, Value};
use agentrt_registry::{FunctionEntry, RegistryError, Registry, Visibility};
use agentrt_store::StateHandle;

use crate::agent::Agent;
use crate::handler::EventHandler;
use crate::log::EventLog;
use crate::task_loop::{TaskInput, TaskLoop};

/// The ambient per-turn context a sub-agent call closure needs but cannot
/// receive as an ordinary `HostFn` argument.
#[derive(Clone)]
pub(crate) struct DispatchContext {
    pub state: StateHandle,
    pub namespace: Namespace,
    pub event_log: Arc<EventLog>,
    pub handler: Option<Arc<dyn EventHandler>>,
    pub parent_task: TaskId,
}

thread_local! {
    static STACK: RefCell<Vec<DispatchContext>> = const { RefCell::new(Vec::new()) };
}

/// RAII guard restoring the previous dispatch context (if any) on drop.
pub(crate) struct ContextGuard;

impl Drop for ContextGuard {
    fn drop(&mut self) {
        STACK.with(|s| {
                s.borrow_mut().pop();
        });
    }
}

/// Install `ctx` as the current thread's dispatch context for the
/// lifetime of the returned guard.
pub(crate) fn install(ctx: DispatchContext) -> ContextGuard {
    STACK.with(|s| s.borrow_mut().push(ctx));
    ContextGuard
}

/// The innermost (most deeply nested) dispatch context currently
/// installed, if a turn is in progress on this thread.
pub(crate) fn current() -> Option<DispatchContext> {
    STACK.with(|s| s.borrow().last().cloned())
}

/// Bind `child` as a callable sub-agent task under `name` in `registry`
///. Sandbox code that calls `name(...)`
/// runs `child`'s own task loop to a terminal signal, sharing the calling
/// turn's state and event log under `<caller namespace>/<name>`.
///
/// The child's commits are parented to the parent's latest commit and its
/// iteration budget is its own `max_iterations`, not whatever remains of
/// the parent's — both fall out
/// naturally here since the child runs through a fresh `TaskLoop` over the
/// same `StateHandle`.
pub fn bind_agent(registry: &mut Registry, name: impl Into<String>, child: Arc<Agent>) {
    let name = name.into();
    let signature = format!("{}(*args) -> any", name);
    let docstring = format!("dispatches to the '{}' sub-agent", child.name);
    let closure_child = child.clone();
    let entry = FunctionEntry::new(
        Arc::new(move |args: &[Value]| dispatch_call(&closure_child, args)),
        signature,
    )
        .with_visibility(Visibility::Medium)
        .with_docstring(docstring);
    registry.register_function(name, entry);
}

fn dispatch_call(child: &Arc<Agent>, args: &[Value]) -> Result<Value, RegistryError> {
    let ctx = current().ok_or_else(|| RegistryError::HostCallFailed {
            message: "sub-agent call attempted outside an active task loop turn".to_string(),
    })?;
    let child_namespace = ctx.namespace.child(child.name.clone());
    let input = TaskInput::positional(child.name.clone(), args.to_vec()).with_parent(ctx.parent_task);
    let task_loop = TaskLoop::new(child.clone());
    task_loop
        .run(input, ctx.state.clone(), child_namespace, ctx.event_log.clone(), ctx.handler.clone())
        .map_err(|e| RegistryError::HostCallFailed { message: e.to_string() })
}
