use std::sync::Arc;

use agentrt_core::Value;

use crate::error::RegistryError;
use crate::visibility::Visibility;

/// A host function callable from sandbox code.
///
/// Boxed as `Arc<dyn Fn(...)>` rather than a bare `fn` pointer so operators
/// can register closures that capture host-side state (a database handle,
/// an HTTP client,...) at registration time.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value, RegistryError> + Send + Sync>;

/// A registered host function.
#[derive(Clone)]
pub struct FunctionEntry {
    /// The callable itself.
    pub callable: HostFn,
    /// Rendering visibility.
    pub visibility: Visibility,
    /// Human-readable signature, e.g. `"square(x: int) -> int"`.
    pub signature: String,
    /// Docstring shown to the oracle at `High` visibility.
    pub docstring: Option<String>,
    /// Declared parameter type names, used by `task_success`'s best-effort
    /// structural return-type check and by the renderer.
    pub declared_types: Vec<String>,
}

impl FunctionEntry {
    /// Start building a function entry around `callable`, defaulting to
    /// `Medium` visibility and no docstring.
    pub fn new(callable: HostFn, signature: impl Into<String>) -> Self {
        Self {
            callable,
            visibility: Visibility::default(),
            signature: signature.into(),
            docstring: None,
            declared_types: Vec::new(),
        }
    }

    /// Override visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach a docstring.
    pub fn with_docstring(mut self, doc: impl Into<String>) -> Self {
        self.docstring = Some(doc.into());
        self
    }

    /// Attach declared parameter type names.
    pub fn with_declared_types(mut self, types: Vec<String>) -> Self {
        self.declared_types = types;
        self
    }

    /// Invoke the underlying callable.
    pub fn call(&self, args: &[Value]) -> Result<Value, RegistryError> {
        (self.callable)(args)
    }
}

impl std::fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionEntry")
            .field("signature", &self.signature)
            .field("visibility", &self.visibility)
            .field("docstring", &self.docstring)
            .finish()
    }
}
