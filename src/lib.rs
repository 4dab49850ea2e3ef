//! # agentrt
//!
//! A sandboxed agentic code-execution runtime: a versioned key-value state
//! store, a per-agent capability whitelist, a restricted-language
//! tree-walking interpreter, and the bounded think-act task loop that
//! drives an LLM oracle against all three.
//!
//! This crate re-exports the public surface of the workspace's component
//! crates so a consumer can depend on `agentrt` alone. Internal crates
//! (`agentrt-core`, `agentrt-kv`, `agentrt-store`, `agentrt-registry`,
//! `agentrt-sandbox`, `agentrt-render`, `agentrt-agent`) remain usable
//! directly for callers who only need one layer.
//!
//! ```no_run
//! use agentrt::{Agent, AgentConfig, Registry, Runtime, TaskInput};
//! use std::sync::Arc;
//!
//! # fn example(oracle: Arc<dyn agentrt::Oracle>) -> Result<(), agentrt::Error> {
//! let agent = Agent::new("researcher", AgentConfig::builder().build(), Registry::new(), oracle);
//! let runtime = Runtime::new();
//! let (value, _log) = runtime.run_task(agent, TaskInput::new("find_answer"))?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

mod error;
mod runtime;

pub use error::Error;
pub use runtime::Runtime;

pub use agentrt_agent::{
    bind_agent, Agent, AgentConfig, AgentConfigBuilder, AgentError, Event, EventHandler, EventKind,
    EventLog, Oracle, OracleError, Task, TaskInput, TaskLoop,
};
pub use agentrt_core::{
    AgentFingerprint, ByteStore, CommitHash, CoreError, HostHandle, HostHandleId, Limits, Namespace,
    SandboxFunction, SnapshotView, TaskId, Timestamp, TypeDescriptor, TypeTag, Value, ValueRef,
    Version,
};
pub use agentrt_kv::{CachedStore, DiskStore, KvError, MemoryStore};
pub use agentrt_registry::{
    Capability, CapabilityDescription, ClassEntry, FunctionEntry, HostFn, InstanceEntry,
    MemberOverride, ModuleEntry, Pattern, Registry, RegistryError, ResolvedMember, Visibility,
};
pub use agentrt_render::{
    estimate_message_tokens, estimate_tokens, render, Message, RenderEvent, RenderEventKind, Role,
    TaskSignature,
};
pub use agentrt_sandbox::{
    parse, EvalError, ExceptionKind, Flow, Interpreter, OutputPayload, RunOutcome, SandboxError,
    Signal,
};
pub use agentrt_store::{
    Commit, LiveStore, NamespacedView, StateHandle, StoreError, VersionedSession, VersionedStore,
};

/// Convenience alias for `Result<T, agentrt::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
