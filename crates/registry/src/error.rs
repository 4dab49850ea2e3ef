use thiserror::Error;

/// Errors raised while registering or resolving capabilities.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A registration named something already bound to a different kind of
    /// capability (e.g. registering a class under a name already holding a
    /// function).
    #[error("{name} is already registered as a {existing_kind}")]
    Conflict {
        /// The colliding name.
        name: String,
        /// What it was already registered as.
        existing_kind: &'static str,
    },

    /// An override targeted a dotted path whose prefix does not match any
    /// registered class, module, or instance.
    #[error("no registered class/module/instance matches override target {target}")]
    UnknownOverrideTarget {
        /// The dotted override target, e.g. `"lib.foo"`.
        target: String,
    },

    /// A host callable invoked through the registry returned an error.
    #[error("host call failed: {message}")]
    HostCallFailed {
        /// Description of the underlying failure.
        message: String,
    },

    /// A malformed glob pattern was supplied.
    #[error("invalid pattern: {pattern}")]
    InvalidPattern {
        /// The offending pattern string.
        pattern: String,
    },
}
