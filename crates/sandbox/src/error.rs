use thiserror::Error;

/// The catchable exception kinds a sandbox `try/except` may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    ValueError,
    TypeError,
    KeyError,
    IndexError,
    ZeroDivisionError,
    RuntimeError,
    NonPersistableError,
}

impl ExceptionKind {
    /// Parse an exception class name as it appears in `except Name:`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ValueError" => Some(Self::ValueError),
            "TypeError" => Some(Self::TypeError),
            "KeyError" => Some(Self::KeyError),
            "IndexError" => Some(Self::IndexError),
            "ZeroDivisionError" => Some(Self::ZeroDivisionError),
            "RuntimeError" => Some(Self::RuntimeError),
            "NonPersistableError" => Some(Self::NonPersistableError),
            _ => None,
        }
    }

    /// Canonical name, as used in error messages and exception record
    /// `type_tag`s.
    pub fn name(self) -> &'static str {
        match self {
            Self::ValueError => "ValueError",
            Self::TypeError => "TypeError",
            Self::KeyError => "KeyError",
            Self::IndexError => "IndexError",
            Self::ZeroDivisionError => "ZeroDivisionError",
            Self::RuntimeError => "RuntimeError",
            Self::NonPersistableError => "NonPersistableError",
        }
    }
}

/// Errors raised by the lexer, parser, or evaluator.
///
/// Per's "mistakes the agent can learn from become observations"
/// rule, every variant here except internal bugs is meant to be surfaced by
/// the agent loop as a synthetic `Output` event, not an unrecoverable
/// exception — the loop decides that policy, this enum just carries enough
/// structure for it to do so.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// A construct outside the restricted grammar was used.
    #[error("forbidden syntax at {line}:{col}: {message}")]
    ForbiddenSyntax { line: usize, col: usize, message: String },

    /// A general parse failure (unexpected token, unterminated string,...).
    #[error("parse error at {line}:{col}: {message}")]
    ParseError { line: usize, col: usize, message: String },

    /// A call target was not a sandbox function, registered host function,
    /// or bound method of an exposed class.
    #[error("forbidden call: {target}")]
    ForbiddenCall { target: String },

    /// An `obj.attr` expression resolved to a member the registry does not
    /// make available.
    #[error("forbidden attribute access: {type_name}.{attr}")]
    ForbiddenAttributeAccess { type_name: String, attr: String },

    /// An `import` named a symbol outside the agent's whitelist.
    #[error("forbidden import: {name}")]
    ForbiddenImport { name: String },

    /// A name did not resolve in any layered scope.
    #[error("name not found: {name}")]
    NameNotFound { name: String },

    /// A value failed a type expectation.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    /// Dictionary/record key lookup miss.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// Sequence index out of bounds.
    #[error("index out of range: {index}")]
    IndexOutOfRange { index: i64 },

    /// Division or modulo by zero.
    #[error("division by zero")]
    ZeroDivision,

    /// Catch-all for conditions the evaluator treats as a `RuntimeError`.
    #[error("runtime error: {message}")]
    Runtime { message: String },

    /// A value could not be committed because it refuses snapshot
    /// degradation, surfaced here so sandbox code can catch
    /// `NonPersistableError` around a risky assignment.
    #[error("value not persistable: {reason}")]
    NonPersistable { reason: String },

    /// Single-fragment evaluation exceeded its wall-clock budget.
    #[error("execution timeout after {elapsed_ms}ms")]
    ExecutionTimeout { elapsed_ms: u128 },

    /// An opaque handle's registry entry could not be resolved when the
    /// value was used.
    #[error("stale handle: {registered_name}")]
    StaleHandle { registered_name: String },

    /// Underlying storage operation failed.
    #[error("store error: {0}")]
    Store(#[from] agentrt_store::StoreError),

    /// Underlying registry operation failed.
    #[error("registry error: {0}")]
    Registry(#[from] agentrt_registry::RegistryError),
}

impl SandboxError {
    /// Which catchable exception kind (if any) this error corresponds to,
    /// for `try/except` dispatch.
    pub fn exception_kind(&self) -> Option<ExceptionKind> {
        match self {
            SandboxError::TypeMismatch {.. } => Some(ExceptionKind::TypeError),
            SandboxError::KeyNotFound {.. } => Some(ExceptionKind::KeyError),
            SandboxError::IndexOutOfRange {.. } => Some(ExceptionKind::IndexError),
            SandboxError::ZeroDivision => Some(ExceptionKind::ZeroDivisionError),
            SandboxError::Runtime {.. } => Some(ExceptionKind::RuntimeError),
            SandboxError::NonPersistable {.. } => Some(ExceptionKind::NonPersistableError),
            SandboxError::Store(e) if matches!(e, agentrt_store::StoreError::NonPersistable {.. }) => {
                Some(ExceptionKind::NonPersistableError)
            }
            _ => None,
        }
    }

    /// Whether this error is the kind the agent loop turns into a synthetic
    /// output observation rather than propagating as a hard failure
    ///.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SandboxError::Store(agentrt_store::StoreError::Backing(inner)) => !inner.is_terminal(),
            SandboxError::Store(_) => true,
            _ => true,
        }
    }
}
