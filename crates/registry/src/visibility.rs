/// Per-capability rendering flag.
///
/// Visibility controls whether — and how much of — a capability the
/// [Context Renderer](../agentrt_render) shows the oracle. It never affects
/// callability: a `Low` visibility function is just as callable from
/// sandbox code as a `High` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    /// Hidden from the rendered capability list, but still callable.
    Low,
    /// Signature only, no docstring.
    Medium,
    /// Full signature and docstring.
    High,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Medium
    }
}
