//! Agent task loop, event log, and oracle contract.
//!
//! [`task_loop::TaskLoop`] is the think-act iteration driver: it renders
//! context through `agentrt-render`, calls an [`oracle::Oracle`], parses
//! and executes the returned code fragment through `agentrt-sandbox`, and
//! folds the result into [`event::Event`]s on an [`log::EventLog`]. A task
//! whose registry exposes a bound sub-agent (via [`dispatch::bind_agent`])
//! recurses into that agent's own `TaskLoop::run_task` from within the
//! sandbox call, sharing the parent's state and event log under a child
//! namespace.

pub mod agent;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handler;
pub mod log;
pub mod oracle;
pub mod task;
pub mod task_loop;

pub use agent::Agent;
pub use config::{AgentConfig, AgentConfigBuilder};
pub use dispatch::bind_agent;
pub use error::AgentError;
pub use event::{Event, EventKind};
pub use handler::EventHandler;
pub use log::EventLog;
pub use oracle::{Oracle, OracleError};
pub use task::Task;
pub use task_loop::{TaskInput, TaskLoop};
