//! Unified error type for the `agentrt` facade: wraps each component
//! crate's own error type via `#[from]` so callers going through the
//! facade can propagate with a single `?` across crate boundaries.
//!
//! Callers that only use one layer directly (e.g. `agentrt_store` alone)
//! can keep matching on that crate's own error type; `Error` exists for
//! callers who go through the facade and want one type to propagate with
//! `?` across crate boundaries.

use thiserror::Error;

/// Umbrella error covering every component crate the facade re-exports.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Agent(#[from] agentrt_agent::AgentError),

    #[error(transparent)]
    Core(#[from] agentrt_core::CoreError),

    #[error(transparent)]
    Kv(#[from] agentrt_kv::KvError),

    #[error(transparent)]
    Store(#[from] agentrt_store::StoreError),

    #[error(transparent)]
    Registry(#[from] agentrt_registry::RegistryError),

    #[error(transparent)]
    Sandbox(#[from] agentrt_sandbox::SandboxError),
}

impl Error {
    /// Whether retrying the same operation unchanged might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Agent(e) => e.is_retryable(),
            Error::Core(e) => e.is_retryable(),
            Error::Kv(e) => e.is_retryable(),
            Error::Store(e) => e.is_retryable(),
            Error::Sandbox(e) => e.is_recoverable(),
            Error::Registry(_) => false,
        }
    }

    /// Whether this error reflects a mistake or condition no retry will fix.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}
