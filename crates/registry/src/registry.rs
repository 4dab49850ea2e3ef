use std::collections::HashMap;

use agentrt_core::Value;

use crate::class::ClassEntry;
use crate::error::RegistryError;
use crate::function::FunctionEntry;
use crate::instance::InstanceEntry;
use crate::module::ModuleEntry;
use crate::overrides::MemberOverride;
use crate::visibility::Visibility;

/// What kind of capability a name in a [`Registry`] was found to be — the
/// dispatch tag the sandbox's attribute/call resolution switches on.
pub enum Capability<'a> {
    Function(&'a FunctionEntry),
    Class(&'a ClassEntry),
    Module(&'a ModuleEntry),
    Instance(&'a InstanceEntry),
}

/// A fully-resolved description of one registered capability, for the
/// Context Renderer.
#[derive(Debug, Clone)]
pub struct CapabilityDescription {
    /// Capability name as sandbox code refers to it.
    pub name: String,
    /// `"function" | "class" | "module" | "instance"`.
    pub kind: &'static str,
    /// Rendering visibility.
    pub visibility: Visibility,
    /// Signature line, if applicable (functions only).
    pub signature: Option<String>,
    /// Docstring, shown only when visibility is `High`.
    pub docstring: Option<String>,
}

/// Per-agent whitelist of functions, classes, modules, and instances
///.
///
/// Registries are immutable after their owning agent's first task
/// invocation; nothing in this type enforces that
/// itself — it is a convention the `agentrt-agent` task loop honors by
/// never handing out `&mut Registry` once a task has run.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, FunctionEntry>,
    classes: HashMap<String, ClassEntry>,
    modules: HashMap<String, ModuleEntry>,
    instances: HashMap<String, InstanceEntry>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level function.
    pub fn register_function(&mut self, name: impl Into<String>, entry: FunctionEntry) {
        self.functions.insert(name.into(), entry);
    }

    /// Register a class.
    pub fn register_class(&mut self, name: impl Into<String>, entry: ClassEntry) {
        self.classes.insert(name.into(), entry);
    }

    /// Register a module.
    pub fn register_module(&mut self, name: impl Into<String>, entry: ModuleEntry) {
        self.modules.insert(name.into(), entry);
    }

    /// Register an instance under its explicit binding name.
    pub fn register_instance(&mut self, binding_name: impl Into<String>, entry: InstanceEntry) {
        self.instances.insert(binding_name.into(), entry);
    }

    /// Apply a later, more specific override to an already-registered
    /// class, module, or instance member: `registry.override_member("lib.foo",...)` refines the
    /// `foo` member of the `lib` module/class/instance registered earlier.
    pub fn override_member(&mut self, dotted_target: &str, over: MemberOverride) -> Result<(), RegistryError> {
        let (owner, member) = dotted_target
            .split_once('.')
            .ok_or_else(|| RegistryError::UnknownOverrideTarget {
                target: dotted_target.to_string(),
        })?;
        if let Some(class) = self.classes.get_mut(owner) {
            class.override_member(member, over);
            return Ok(());
        }
        if let Some(module) = self.modules.get_mut(owner) {
            module.override_member(member, over);
            return Ok(());
        }
        if let Some(instance) = self.instances.get_mut(owner) {
            instance.override_member(member, over);
            return Ok(());
        }
        Err(RegistryError::UnknownOverrideTarget {
                target: dotted_target.to_string(),
        })
    }

    /// Look up a top-level name, returning which capability kind it is.
    pub fn resolve(&self, name: &str) -> Option<Capability<'_>> {
        if let Some(f) = self.functions.get(name) {
            return Some(Capability::Function(f));
        }
        if let Some(c) = self.classes.get(name) {
            return Some(Capability::Class(c));
        }
        if let Some(m) = self.modules.get(name) {
            return Some(Capability::Module(m));
        }
        if let Some(i) = self.instances.get(name) {
            return Some(Capability::Instance(i));
        }
        None
    }

    /// Whether `name` is bound to anything in this registry.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Direct function lookup (used by the interpreter's call-site policy).
    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    /// Direct class lookup.
    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    /// Direct module lookup.
    pub fn module(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.get(name)
    }

    /// Direct instance lookup.
    pub fn instance(&self, name: &str) -> Option<&InstanceEntry> {
        self.instances.get(name)
    }

    /// Resolve the class registered under `type_tag`, used when the
    /// interpreter needs to check a host value's member policy by its
    /// runtime type name rather than by the binding name it was exposed
    /// under.
    pub fn class_by_type_tag(&self, type_tag: &str) -> Option<&ClassEntry> {
        self.classes
            .values()
            .find(|c| c.type_descriptor.name == type_tag)
    }

    /// Every registered capability, in the override-applied view the
    /// Context Renderer consumes.
    pub fn describe(&self) -> Vec<CapabilityDescription> {
        let mut out = Vec::new();
        for (name, f) in &self.functions {
            out.push(CapabilityDescription {
                    name: name.clone(),
                    kind: "function",
                    visibility: f.visibility,
                    signature: Some(f.signature.clone()),
                    docstring: f.docstring.clone(),
            });
        }
        for (name, c) in &self.classes {
            out.push(CapabilityDescription {
                    name: name.clone(),
                    kind: "class",
                    visibility: c.visibility,
                    signature: None,
                    docstring: None,
            });
        }
        for (name, m) in &self.modules {
            out.push(CapabilityDescription {
                    name: name.clone(),
                    kind: "module",
                    visibility: m.visibility,
                    signature: None,
                    docstring: None,
            });
        }
        for (name, i) in &self.instances {
            out.push(CapabilityDescription {
                    name: name.clone(),
                    kind: "instance",
                    visibility: i.visibility,
                    signature: None,
                    docstring: None,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Describe capabilities at or above `min_visibility`, used to honor
    /// "low -> hidden from the rendering but still callable".
    pub fn describe_filtered(&self, min_visibility: Visibility) -> Vec<CapabilityDescription> {
        self.describe()
            .into_iter()
            .filter(|c| c.visibility >= min_visibility)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_core::TypeDescriptor;
    use std::sync::Arc;

    fn entry() -> FunctionEntry {
        FunctionEntry::new(Arc::new(|args: &[Value]| Ok(args[0].clone())), "identity(x) -> x")
    }

    #[test]
    fn resolves_registered_function() {
        let mut reg = Registry::new();
        reg.register_function("identity", entry());
        assert!(matches!(reg.resolve("identity"), Some(Capability::Function(_))));
        assert!(reg.resolve("missing").is_none());
    }

    #[test]
    fn override_member_refines_bulk_module_registration() {
        let mut reg = Registry::new();
        reg.register_module("lib", ModuleEntry::new().with_visibility(Visibility::Low));
        reg.override_member("lib.foo", MemberOverride::visibility(Visibility::High))
            .unwrap();
        let module = reg.module("lib").unwrap();
        assert_eq!(module.resolve_member("foo").unwrap().visibility, Visibility::High);
        assert_eq!(module.resolve_member("bar").unwrap().visibility, Visibility::Low);
    }

    #[test]
    fn override_unknown_target_is_an_error() {
        let mut reg = Registry::new();
        let err = reg
            .override_member("ghost.member", MemberOverride::visibility(Visibility::High))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownOverrideTarget {.. }));
    }

    #[test]
    fn describe_filtered_hides_low_visibility() {
        let mut reg = Registry::new();
        reg.register_function(
            "hidden",
            entry().with_visibility(Visibility::Low),
        );
        reg.register_function(
            "shown",
            entry().with_visibility(Visibility::High),
        );
        let described = reg.describe_filtered(Visibility::Medium);
        assert!(described.iter().any(|c| c.name == "shown"));
        assert!(!described.iter().any(|c| c.name == "hidden"));
    }

    #[test]
    fn class_by_type_tag_finds_registered_class() {
        let mut reg = Registry::new();
        reg.register_class("Vector", ClassEntry::new(TypeDescriptor { name: "Vector".into() }));
        assert!(reg.class_by_type_tag("Vector").is_some());
        assert!(reg.class_by_type_tag("Nope").is_none());
    }
}
