use std::collections::HashMap;

use agentrt_core::{HostHandle, Value};

use crate::error::RegistryError;
use crate::function::HostFn;
use crate::overrides::{MemberOverride, ResolvedMember};
use crate::pattern::Pattern;
use crate::visibility::Visibility;

/// A bound live host object exposed to the sandbox under an explicit
/// binding name.
pub struct InstanceEntry {
    /// Degraded descriptor for this instance (used on snapshot/rendering).
    pub handle: HostHandle,
    /// Member name -> bound-method/field accessor.
    pub members: HashMap<String, HostFn>,
    /// Members matching this pattern are available, unless excluded.
    pub include: Pattern,
    /// Members matching this pattern are never available.
    pub exclude: Option<Pattern>,
    /// Default rendering visibility.
    pub visibility: Visibility,
    /// Per-member refinements, keyed by member name.
    pub per_member_overrides: HashMap<String, MemberOverride>,
}

impl InstanceEntry {
    /// Bind `handle` under this entry's explicit binding name (the key the
    /// caller registers it under in the registry's instance table).
    pub fn new(handle: HostHandle) -> Self {
        Self {
            handle,
            members: HashMap::new(),
            include: Pattern::all(),
            exclude: None,
            visibility: Visibility::default(),
            per_member_overrides: HashMap::new(),
        }
    }

    /// Register a bound-method/field accessor.
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

    /// Add/merge a per-member override.
    pub fn override_member(&mut self, member: impl Into<String>, over: MemberOverride) {
        self.per_member_overrides.insert(member.into(), over);
    }

    /// Whether `member` is available.
    pub fn is_member_available(&self, member: &str) -> bool {
        let included = self.include.matches(member);
        let excluded = self.exclude.as_ref().is_some_and(|p| p.matches(member));
        included && !excluded
    }

    /// Fully resolve `member`'s visibility/docstring, applying any
    /// override.
    pub fn resolve_member(&self, member: &str) -> Option<ResolvedMember> {
        if !self.is_member_available(member) {
            return None;
        }
        let over = self.per_member_overrides.get(member);
        Some(ResolvedMember {
                name: member.to_string(),
                visibility: over.and_then(|o| o.visibility).unwrap_or(self.visibility),
                docstring: over.and_then(|o| o.docstring.clone()),
                constructable: true,
        })
    }

    /// Invoke a bound member by name, enforcing availability first.
    pub fn call_member(&self, member: &str, args: &[Value]) -> Result<Value, RegistryError> {
        if !self.is_member_available(member) {
            return Err(RegistryError::Conflict {
                    name: member.to_string(),
                    existing_kind: "unavailable instance member",
            });
        }
        let callable = self
            .members
            .get(member)
            .ok_or_else(|| RegistryError::Conflict {
                name: member.to_string(),
                existing_kind: "instance member with no implementation",
        })?;
        callable(args)
    }

    /// The live value this entry exposes to sandbox code as the bound
    /// name's value (e.g. `Value::Host(self.handle.clone())`).
    pub fn as_value(&self) -> Value {
        Value::Host(self.handle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn instance_exposes_its_handle_as_a_host_value() {
        let handle = HostHandle {
            kind: "instance".into(),
            registered_name: "judge".into(),
            type_tag: "Judge".into(),
            live: None,
        };
        let entry = InstanceEntry::new(handle.clone())
            .with_member("score", Arc::new(|_: &[Value]| Ok(Value::Int(1))));
        assert_eq!(entry.as_value(), Value::Host(handle));
        assert!(entry.is_member_available("score"));
    }
}
