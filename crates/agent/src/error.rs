//! Terminal, user-visible exceptions raised out of a task invocation
//!.
//!
//! Everything the sandbox evaluator raises that the error table marks
//! non-terminal (forbidden calls, name errors, type mismatches, parse
//! errors...) never reaches this type: the task loop folds those into
//! synthetic `Output` events instead. Only the five outcomes below ever
//! stop a task loop from the caller's point of view.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The task's own code called `task_fail(...)`.
    #[error("task failed: {message}")]
    TaskFail { message: String },

    /// The task's own code called `task_clarify(...)`.
    #[error("task requires clarification: {message}")]
    TaskClarify { message: String },

    /// `max_iterations` turns elapsed with no terminal signal.
    #[error("task exceeded max_iterations ({max_iterations}) without reaching a terminal signal")]
    TaskTimeout { max_iterations: usize },

    /// The oracle failed `llm_max_retries + 1` consecutive attempts.
    #[error("oracle call failed after {attempts} attempts: {message}")]
    LLMFailure { attempts: usize, message: String },

    /// A turn tried to snapshot a value that refuses degradation.
    #[error("value at key {key} is not persistable: {reason}")]
    NonPersistable { key: String, reason: String },

    /// The backing versioned/live store failed for a reason unrelated to
    /// the agent's own mistakes (disk I/O, corruption, unknown commit).
    #[error("store error: {0}")]
    Store(#[from] agentrt_store::StoreError),

    /// Registering or resolving a capability (e.g. a sub-agent binding)
    /// failed.
    #[error("registry error: {0}")]
    Registry(#[from] agentrt_registry::RegistryError),
}

impl AgentError {
    /// Every variant here is, by construction, a framework-level stop —
    /// the non-terminal cases never reach `AgentError` at all.
    pub fn is_terminal(&self) -> bool {
        true
    }

    /// Whether retrying the same task invocation unchanged might succeed.
    /// Only transient store failures qualify; a `TaskFail`/`TaskTimeout`/
    /// `LLMFailure` reflects either the agent's own judgment or an
    /// exhausted retry budget, not a transient condition.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Store(e) if e.is_retryable())
    }
}
