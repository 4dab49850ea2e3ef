//! Size and count limits shared across the byte KV, versioned store, and
//! sandbox layers: named, documented constants plus a small struct so
//! callers can override per deployment instead of hardcoding numbers at
//! each call site.

/// Default maximum key length, in bytes.
pub const DEFAULT_MAX_KEY_BYTES: usize = 1024;

/// Default maximum encoded value size, in bytes.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 16 * 1024 * 1024;

/// Default maximum number of commits retained in a single branch lineage
/// before callers are expected to prune (advisory; stores do not enforce
/// this themselves).
pub const DEFAULT_MAX_HISTORY_LEN: usize = 10_000;

/// Default maximum number of think-act iterations for a single task.
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

/// Configurable limits, threaded through the KV, store, and agent layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum key length, in bytes.
    pub max_key_bytes: usize,
    /// Maximum encoded value size, in bytes.
    pub max_value_bytes: usize,
    /// Maximum retained commits per branch lineage.
    pub max_history_len: usize,
    /// Maximum think-act iterations per task.
    pub max_iterations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_key_bytes: DEFAULT_MAX_KEY_BYTES,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
            max_history_len: DEFAULT_MAX_HISTORY_LEN,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Limits {
    /// Start from the defaults; use the builder methods below to override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum key length.
    pub fn with_max_key_bytes(mut self, n: usize) -> Self {
        self.max_key_bytes = n;
        self
    }

    /// Override the maximum value size.
    pub fn with_max_value_bytes(mut self, n: usize) -> Self {
        self.max_value_bytes = n;
        self
    }

    /// Override the maximum retained history length.
    pub fn with_max_history_len(mut self, n: usize) -> Self {
        self.max_history_len = n;
        self
    }

    /// Override the maximum iteration count.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let l = Limits::default();
        assert!(l.max_key_bytes > 0);
        assert!(l.max_value_bytes > l.max_key_bytes);
    }

    #[test]
    fn builder_overrides_apply() {
        let l = Limits::new().with_max_key_bytes(64).with_max_iterations(5);
        assert_eq!(l.max_key_bytes, 64);
        assert_eq!(l.max_iterations, 5);
        assert_eq!(l.max_value_bytes, DEFAULT_MAX_VALUE_BYTES);
    }
}
