//! Shared value model, error taxonomy, and addressing types for the agent
//! runtime.
//!
//! Every other crate in the workspace depends on this one for:
//! - [`value::Value`], the closed tagged union every sandbox value belongs to
//! - [`error::CoreError`], the shared error taxonomy
//! - [`types::Namespace`] / [`types::AgentFingerprint`] / [`types::TaskId`] /
//! [`types::CommitHash`], the addressing primitives
//! - [`contract`], the `ValueRef`/`Version`/`Timestamp` addressing contract
//! - [`traits::ByteStore`] / [`traits::SnapshotView`], the storage trait
//! boundaries shared by the KV and store crates
//! - [`limits::Limits`], configurable size/count budgets

pub mod contract;
pub mod error;
pub mod limits;
pub mod traits;
pub mod types;
pub mod value;

pub use contract::{Timestamp, TypeTag, Version, ValueRef};
pub use error::CoreError;
pub use limits::Limits;
pub use traits::{ByteStore, SnapshotView};
pub use types::{AgentFingerprint, CommitHash, Namespace, TaskId};
pub use value::{HostHandle, HostHandleId, SandboxFunction, TypeDescriptor, Value};
