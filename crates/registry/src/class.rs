use std::collections::HashMap;

use agentrt_core::{TypeDescriptor, Value};

use crate::error::RegistryError;
use crate::function::HostFn;
use crate::overrides::{MemberOverride, ResolvedMember};
use crate::pattern::Pattern;
use crate::visibility::Visibility;

/// A host class exposed to the sandbox.
///
/// Bound methods are resolved through `members` when sandbox code does
/// `instance.method(...)`; the class itself only gates *which* member
/// names are visible and whether `Cls(...)` construction is permitted.
pub struct ClassEntry {
    /// Reflective type descriptor returned by `type-of`.
    pub type_descriptor: TypeDescriptor,
    /// Member name -> host callable (bound method implementations).
    pub members: HashMap<String, HostFn>,
    /// Members matching this pattern are available, unless excluded.
    pub include: Pattern,
    /// Members matching this pattern are never available, even if included.
    pub exclude: Option<Pattern>,
    /// Default rendering visibility for members without an override.
    pub visibility: Visibility,
    /// Whether sandbox code may call `Cls(...)` to construct an instance
    ///.
    pub constructable: bool,
    /// Host callable backing `Cls(...)`, required iff `constructable`.
    pub constructor: Option<HostFn>,
    /// Per-member refinements, keyed by member name.
    pub per_member_overrides: HashMap<String, MemberOverride>,
}

impl ClassEntry {
    /// Start building a class entry. Defaults: include everything, no
    /// exclusions, `Medium` visibility, not constructable.
    pub fn new(type_descriptor: TypeDescriptor) -> Self {
        Self {
            type_descriptor,
            members: HashMap::new(),
            include: Pattern::all(),
            exclude: None,
            visibility: Visibility::default(),
            constructable: false,
            constructor: None,
            per_member_overrides: HashMap::new(),
        }
    }

    /// Register a bound-method implementation.
    pub fn with_member(mut self, name: impl Into<String>, callable: HostFn) -> Self {
        self.members.insert(name.into(), callable);
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

    /// Mark constructable, supplying the constructor callable.
    pub fn with_constructor(mut self, constructor: HostFn) -> Self {
        self.constructable = true;
        self.constructor = Some(constructor);
        self
    }

    /// Add/merge a per-member override.
    pub fn override_member(&mut self, member: impl Into<String>, over: MemberOverride) {
        self.per_member_overrides.insert(member.into(), over);
    }

    /// Whether `member` is available on this class per the include/exclude
    /// patterns.
    pub fn is_member_available(&self, member: &str) -> bool {
        let included = self.include.matches(member);
        let excluded = self.exclude.as_ref().is_some_and(|p| p.matches(member));
        included && !excluded
    }

    /// Fully resolve `member`'s visibility/docstring/constructability,
    /// applying any override on top of this class's defaults. Returns
    /// `None` if the member is not available.
    pub fn resolve_member(&self, member: &str) -> Option<ResolvedMember> {
        if !self.is_member_available(member) {
            return None;
        }
        let over = self.per_member_overrides.get(member);
        Some(ResolvedMember {
                name: member.to_string(),
                visibility: over.and_then(|o| o.visibility).unwrap_or(self.visibility),
                docstring: over.and_then(|o| o.docstring.clone()),
                constructable: over.and_then(|o| o.constructable).unwrap_or(true),
        })
    }

    /// Invoke a bound method by name, enforcing availability first.
    pub fn call_member(&self, member: &str, args: &[Value]) -> Result<Value, RegistryError> {
        if !self.is_member_available(member) {
            return Err(RegistryError::Conflict {
                    name: member.to_string(),
                    existing_kind: "unavailable class member",
            });
        }
        let callable = self
            .members
            .get(member)
            .ok_or_else(|| RegistryError::Conflict {
                name: member.to_string(),
                existing_kind: "class member with no implementation",
        })?;
        callable(args)
    }

    /// Construct an instance via `Cls(...)`; the caller (sandbox) is
    /// responsible for checking `constructable` first and raising
    /// `ForbiddenCall` otherwise — this just runs the host constructor.
    pub fn construct(&self, args: &[Value]) -> Result<Value, RegistryError> {
        let ctor = self
            .constructor
            .as_ref()
            .ok_or_else(|| RegistryError::Conflict {
                name: self.type_descriptor.name.clone(),
                existing_kind: "class with no constructor",
        })?;
        ctor(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn dummy_fn() -> HostFn {
        Arc::new(|_args: &[Value]| Ok(Value::Null))
    }

    #[test]
    fn include_exclude_gate_availability() {
        let class = ClassEntry::new(TypeDescriptor { name: "Vector".into() })
            .with_include(Pattern::glob("*"))
            .with_exclude(Pattern::glob("_*"));
        assert!(class.is_member_available("normalize"));
        assert!(!class.is_member_available("_private"));
    }

    #[test]
    fn not_constructable_by_default() {
        let class = ClassEntry::new(TypeDescriptor { name: "Verdict".into() });
        assert!(!class.constructable);
        assert!(class.construct(&[]).is_err());
    }

    #[test]
    fn constructable_with_constructor() {
        let class = ClassEntry::new(TypeDescriptor { name: "Point".into() }).with_constructor(dummy_fn());
        assert!(class.constructable);
        assert!(class.construct(&[]).is_ok());
    }

    #[test]
    fn per_member_override_refines_visibility() {
        let mut class = ClassEntry::new(TypeDescriptor { name: "Lib".into() }).with_visibility(Visibility::Low);
        class.override_member("foo", MemberOverride::visibility(Visibility::High));
        let resolved = class.resolve_member("foo").unwrap();
        assert_eq!(resolved.visibility, Visibility::High);
        let other = class.resolve_member("bar");
        assert!(other.is_none() || other.unwrap().visibility == Visibility::Low);
    }
}
