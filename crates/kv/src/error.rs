use thiserror::Error;

/// Errors raised by the byte KV backends.
#[derive(Debug, Error)]
pub enum KvError {
    /// A key exceeded the configured maximum length.
    #[error("key too long: {len} bytes (limit {limit})")]
    KeyTooLong {
        /// Length of the offending key.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A value exceeded the configured maximum size.
    #[error("value too large: {len} bytes (limit {limit})")]
    ValueTooLarge {
        /// Length of the offending value.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The disk backend's root directory could not be read or written.
    #[error("disk backend I/O error at {path}: {source}")]
    Io {
        /// Path the failing operation targeted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A stored entry's on-disk encoding could not be parsed back.
    #[error("corrupt entry at {key}: {reason}")]
    Corruption {
        /// Hex-encoded key of the corrupt entry.
        key: String,
        /// Description of what failed to parse.
        reason: String,
    },
}

impl KvError {
    /// Whether retrying the operation unchanged might succeed (true only
    /// for transient I/O conditions).
    pub fn is_retryable(&self) -> bool {
        matches!(self, KvError::Io {.. })
    }

    /// Whether this error reflects a caller mistake or unrecoverable state.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}

impl From<KvError> for agentrt_core::CoreError {
    fn from(e: KvError) -> Self {
        match e {
            KvError::KeyTooLong { len, limit } => agentrt_core::CoreError::CapacityExceeded {
                resource: "key_len".into(),
                limit,
                requested: len,
            },
            KvError::ValueTooLarge { len, limit } => agentrt_core::CoreError::CapacityExceeded {
                resource: "value_bytes".into(),
                limit,
                requested: len,
            },
            KvError::Io { path, source } => agentrt_core::CoreError::Internal {
                message: format!("kv io error at {path}: {source}"),
            },
            KvError::Corruption { key, reason } => agentrt_core::CoreError::Serialization {
                message: format!("corrupt kv entry {key}: {reason}"),
            },
        }
    }
}
