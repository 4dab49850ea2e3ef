use crate::visibility::Visibility;

/// Per-member refinement of visibility/docstring/constructability, keyed by
/// dotted name within a class or module registration.
#[derive(Debug, Clone, Default)]
pub struct MemberOverride {
    /// Override the member's rendered visibility.
    pub visibility: Option<Visibility>,
    /// Override the member's rendered docstring.
    pub docstring: Option<String>,
    /// Override whether the member (a nested class) is constructable.
    pub constructable: Option<bool>,
}

impl MemberOverride {
    /// An override that only changes visibility.
    pub fn visibility(v: Visibility) -> Self {
        Self {
            visibility: Some(v),
                ..Default::default()
        }
    }
}

/// The fully-resolved view of a single capability member, after applying
/// any matching `per_member_overrides` on top of the owning registration's
/// bulk defaults.
#[derive(Debug, Clone)]
pub struct ResolvedMember {
    /// Dotted or plain member name as it appears to sandbox code.
    pub name: String,
    /// Resolved visibility for rendering.
    pub visibility: Visibility,
    /// Resolved docstring, if any.
    pub docstring: Option<String>,
    /// Resolved constructability (classes only; always `true` for plain
    /// functions/module members, which have no constructor call form).
    pub constructable: bool,
}
