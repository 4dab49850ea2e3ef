use std::collections::HashMap;

use agentrt_core::Value;

use crate::error::RegistryError;
use crate::function::HostFn;
use crate::overrides::{MemberOverride, ResolvedMember};
use crate::pattern::Pattern;
use crate::visibility::Visibility;

/// A host module exposed to the sandbox.
///
/// Member names may be dotted (`"Vector.normalize"`) when the module
/// exposes a nested class's methods directly, "Dotted
/// patterns (`Cls.method`) target class members within a module
/// registration".
pub struct ModuleEntry {
    /// Member path (possibly dotted) -> host callable.
    pub members: HashMap<String, HostFn>,
    /// Members matching this pattern are available, unless excluded.
    pub include: Pattern,
    /// Members matching this pattern are never available.
    pub exclude: Option<Pattern>,
    /// Default rendering visibility.
    pub visibility: Visibility,
    /// Whether nested dotted paths beyond one level are permitted.
    pub recursive: bool,
    /// Per-member refinements, keyed by dotted member path.
    pub per_member_overrides: HashMap<String, MemberOverride>,
}

impl ModuleEntry {
    /// Start building a module entry. Defaults: include everything,
    /// `Medium` visibility, non-recursive.
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
            include: Pattern::all(),
            exclude: None,
            visibility: Visibility::default(),
            recursive: false,
            per_member_overrides: HashMap::new(),
        }
    }

    /// Register a member implementation under `path` (plain or dotted).
    pub fn with_member(mut self, path: impl Into<String>, callable: HostFn) -> Self {
        self.members.insert(path.into(), callable);
        self
    }

    /// Override the include pattern.
    pub fn with_include(mut self, pattern: Pattern) -> Self {
        self.include = pattern;
        self
    }

    /// Set an exclude pattern.
    pub fn with_exclude(mut self, pattern: Pattern) -> Self {
        self.exclude = Some(pattern);
        self
    }

    /// Override the default visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Allow nested dotted member paths beyond one level.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Add/merge a per-member override.
    pub fn override_member(&mut self, path: impl Into<String>, over: MemberOverride) {
        self.per_member_overrides.insert(path.into(), over);
    }

    fn depth_allowed(&self, path: &str) -> bool {
        self.recursive || !path.contains('.')
    }

    /// Whether `path` is available on this module.
    pub fn is_member_available(&self, path: &str) -> bool {
        if !self.depth_allowed(path) {
            return false;
        }
        let included = self.include.matches(path);
        let excluded = self.exclude.as_ref().is_some_and(|p| p.matches(path));
        included && !excluded
    }

    /// Fully resolve `path`'s visibility/docstring, applying any override.
    pub fn resolve_member(&self, path: &str) -> Option<ResolvedMember> {
        if !self.is_member_available(path) {
            return None;
        }
        let over = self.per_member_overrides.get(path);
        Some(ResolvedMember {
                name: path.to_string(),
                visibility: over.and_then(|o| o.visibility).unwrap_or(self.visibility),
                docstring: over.and_then(|o| o.docstring.clone()),
                constructable: true,
        })
    }

    /// Invoke a member callable by path, enforcing availability first.
    pub fn call_member(&self, path: &str, args: &[Value]) -> Result<Value, RegistryError> {
        if !self.is_member_available(path) {
            return Err(RegistryError::Conflict {
                    name: path.to_string(),
                    existing_kind: "unavailable module member",
            });
        }
        let callable = self
            .members
            .get(path)
            .ok_or_else(|| RegistryError::Conflict {
                name: path.to_string(),
                existing_kind: "module member with no implementation",
        })?;
        callable(args)
    }
}

impl Default for ModuleEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn dummy_fn() -> HostFn {
        Arc::new(|_args: &[Value]| Ok(Value::Int(0)))
    }

    #[test]
    fn non_recursive_module_rejects_nested_dotted_paths() {
        let module = ModuleEntry::new().with_member("Vector.normalize", dummy_fn());
        assert!(!module.is_member_available("Vector.normalize"));
    }

    #[test]
    fn recursive_module_allows_dotted_class_members() {
        let module = ModuleEntry::new()
            .recursive(true)
            .with_member("Vector.normalize", dummy_fn());
        assert!(module.is_member_available("Vector.normalize"));
    }

    #[test]
    fn override_principle_bulk_then_specific() {
        let mut module = ModuleEntry::new().with_visibility(Visibility::Low);
        module.override_member("foo", MemberOverride::visibility(Visibility::High));
        assert_eq!(module.resolve_member("foo").unwrap().visibility, Visibility::High);
        assert_eq!(module.resolve_member("bar").unwrap().visibility, Visibility::Low);
    }
}
