use thiserror::Error;

/// Errors raised by the versioned store, namespaced views, and the live
/// store layered on top.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested commit hash is not present in the backing store.
    #[error("unknown commit: {hash}")]
    UnknownCommit {
        /// Hex-encoded hash that was requested.
        hash: String,
    },

    /// A value could not be committed because it (or something it
    /// transitively contains) refuses snapshot degradation.
    #[error("value at {key} is not persistable: {reason}")]
    NonPersistable {
        /// Key the offending value was being written to.
        key: String,
        /// Why it could not be persisted.
        reason: String,
    },

    /// The underlying byte store failed.
    #[error("backing store error: {0}")]
    Backing(#[from] agentrt_core::CoreError),

    /// Commit encoding or decoding failed.
    #[error("commit serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Whether retrying unchanged might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Backing(inner) if inner.is_retryable())
    }

    /// Whether this reflects a mistake no retry will fix.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization {
            message: e.to_string(),
        }
    }
}
