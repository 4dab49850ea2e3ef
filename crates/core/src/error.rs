//! Shared error taxonomy for the agent runtime.
//!
//! Every crate boundary in the workspace defines its own narrow error enum
//! and converts into `CoreError` at the point where it crosses into shared
//! code (e.g. a `Value`-level operation). The root `agentrt` crate wraps all
//! of these behind a single umbrella `Error`.

use thiserror::Error;

/// Errors that can occur while manipulating values, namespaces, or commit
/// addresses at the shared-type layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A key or path did not resolve to anything.
    ///
    /// ## Example
    /// Looking up `"orchestrator/worker_a/result"` in a namespace that only
    /// ever wrote `"orchestrator/worker_a/status"`.
    #[error("not found: {entity}")]
    NotFound {
        /// Human-readable description of what was being looked up.
        entity: String,
    },

    /// A value failed a type expectation during a builtin or coercion.
    ///
    /// ## Example
    /// Calling a string method on an `Int` value.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name.
        expected: String,
        /// Actual type name encountered.
        got: String,
    },

    /// A value could not be committed to a versioned store because it (or
    /// something it transitively contains) refuses snapshot degradation.
    ///
    /// ## Example
    /// Assigning a host handle registered with `persistable: false` into a
    /// key that a turn boundary then tries to snapshot.
    #[error("value is not persistable: {reason}")]
    NonPersistable {
        /// Why the value could not be persisted.
        reason: String,
    },

    /// A requested commit hash does not exist in the backing store.
    ///
    /// ## Example
    /// Calling `checkout` with a hash computed in a different process.
    #[error("unknown commit: {hash}")]
    UnknownCommit {
        /// Hex-encoded commit hash that was requested.
        hash: String,
    },

    /// A size or count limit configured on the runtime was exceeded.
    ///
    /// ## Example
    /// A key longer than the configured maximum, or a value whose encoded
    /// size exceeds the configured byte budget.
    #[error("capacity exceeded: {resource} (limit {limit}, requested {requested})")]
    CapacityExceeded {
        /// Which resource's limit was hit (e.g. `"key_len"`, `"value_bytes"`).
        resource: String,
        /// The configured limit.
        limit: usize,
        /// What was actually requested.
        requested: usize,
    },

    /// Failure encoding or decoding a value to/from its wire representation.
    #[error("serialization error: {message}")]
    Serialization {
        /// Underlying description of the failure.
        message: String,
    },

    /// Catch-all for conditions that should be impossible given the
    /// invariants this crate enforces; surfacing one is always a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the invariant that was violated.
        message: String,
    },
}

impl CoreError {
    /// Whether retrying the operation that produced this error might
    /// succeed without any change in inputs (e.g. a transient I/O blip
    /// surfaced as `Serialization` from an underlying codec).
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Internal {.. })
    }

    /// Whether this error reflects a programming/config mistake that no
    /// amount of retrying will fix.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_exceeded_is_terminal() {
        let e = CoreError::CapacityExceeded {
            resource: "key_len".into(),
            limit: 256,
            requested: 512,
        };
        assert!(e.is_terminal());
        assert!(!e.is_retryable());
    }

    #[test]
    fn internal_error_is_retryable() {
        let e = CoreError::Internal {
            message: "unreachable".into(),
        };
        assert!(e.is_retryable());
    }

    #[test]
    fn display_messages_include_context() {
        let e = CoreError::TypeMismatch {
            expected: "int".into(),
            got: "str".into(),
        };
        assert_eq!(e.to_string(), "type mismatch: expected int, got str");
    }
}
