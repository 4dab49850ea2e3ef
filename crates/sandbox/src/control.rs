//! Control-flow plumbing for the evaluator: loop/function flow, terminal
//! task signals, and the turn's output queue.

use agentrt_core::Value;

use crate::error::SandboxError;

/// How a statement or block finished, for `break`/`continue`/`return`
/// propagation up the block-execution recursion.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Option<Value>),
}

/// A terminal task-control intrinsic:
/// `task_success`, `task_fail`, `task_clarify`, `task_continue`. Distinct
/// from [`SandboxError`] because these are never catchable by a sandbox
/// `try/except` — they are the agent loop's control channel, not a
/// language-level exception.
#[derive(Debug, Clone)]
pub enum Signal {
    Success(Value),
    Fail(String),
    Clarify(String),
    Continue(Vec<Value>),
}

/// Everything a statement/expression evaluation can unwind through:
/// ordinary (catchable) sandbox errors, or an uncatchable terminal signal.
#[derive(Debug)]
pub enum EvalError {
    Sandbox(SandboxError),
    Signal(Signal),
}

impl From<SandboxError> for EvalError {
    fn from(e: SandboxError) -> Self {
        EvalError::Sandbox(e)
    }
}

impl From<agentrt_store::StoreError> for EvalError {
    fn from(e: agentrt_store::StoreError) -> Self {
        EvalError::Sandbox(SandboxError::Store(e))
    }
}

impl From<agentrt_registry::RegistryError> for EvalError {
    fn from(e: agentrt_registry::RegistryError) -> Self {
        EvalError::Sandbox(SandboxError::Registry(e))
    }
}

/// One `print`/image-view payload captured during a turn.
#[derive(Debug, Clone)]
pub enum OutputPayload {
    Text(String),
    Value(Value),
}
