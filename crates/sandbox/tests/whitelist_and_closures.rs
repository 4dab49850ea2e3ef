//! Whitelist enforcement and closure-freeze semantics, exercised end to end
//! through the lexer/parser/evaluator against an `agentrt-store` state
//! handle the way the agent task loop drives them.

use std::sync::Arc;
use std::time::Duration;

use agentrt_core::{Namespace, Value};
use agentrt_kv::MemoryStore;
use agentrt_registry::{FunctionEntry, Registry};
use agentrt_sandbox::{parse, Interpreter, SandboxError};
use agentrt_store::{StateHandle, VersionedSession, VersionedStore};

fn run(registry: &Registry, state: StateHandle, source: &str) -> Result<agentrt_sandbox::RunOutcome, agentrt_sandbox::EvalError> {
    let block = parse(source).unwrap();
    let interp = Interpreter::new(registry, state, Namespace::for_agent("t"), Duration::from_secs(5), None);
    interp.run(&block)
}

#[test]
fn calling_an_unregistered_function_is_a_forbidden_call() {
    let registry = Registry::new();
    let err = run(&registry, StateHandle::None, "not_registered(1, 2)").unwrap_err();
    match err {
        agentrt_sandbox::EvalError::Sandbox(SandboxError::ForbiddenCall {.. })
        | agentrt_sandbox::EvalError::Sandbox(SandboxError::NameNotFound {.. }) => {}
        other => panic!("expected a forbidden-call/name-not-found error, got {other:?}"),
    }
}

#[test]
fn registered_function_is_callable() {
    let mut registry = Registry::new();
    registry.register_function(
        "double",
        FunctionEntry::new(Arc::new(|args: &[Value]| match args.first() {
                    Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
                    _ => Err(agentrt_registry::RegistryError::HostCallFailed {
                            message: "expected one int argument".to_string(),
                    }),
            }), "double(n: int) -> int"),
    );
    let outcome = run(&registry, StateHandle::None, "task_success(double(21))").unwrap();
    assert!(matches!(outcome.signal, Some(agentrt_sandbox::Signal::Success(Value::Int(42)))));
}

#[test]
fn closure_captures_are_frozen_at_definition_time() {
    let registry = Registry::new();
    let vs = Arc::new(VersionedStore::new(Arc::new(MemoryStore::default())).unwrap());
    let session = Arc::new(VersionedSession::new(vs));

    // Turn 1: define n and a closure over it, then reassign n.
    run(
        &registry,
        StateHandle::Versioned(session.clone()),
        "n = 1\ndef f(x):\n return x + n\nn = 100\nf_result = f(1)\ntask_success(f_result)",
    )
        .unwrap();

    // A fresh turn over the same state: the closure still observes n == 1
    // at the moment it was defined, not the reassigned n == 100, because a
    // module-level reassignment does not mutate a closure's captured frame.
    let outcome = run(&registry, StateHandle::Versioned(session), "task_success(f_result)").unwrap();
    assert!(matches!(outcome.signal, Some(agentrt_sandbox::Signal::Success(Value::Int(2)))));
}
