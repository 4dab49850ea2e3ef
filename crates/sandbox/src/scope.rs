//! Layered name resolution for the evaluator.
//!
//! Every binding is a `Rc<RefCell<Value>>` "slot" rather than a bare `Value`
//! so in-place container mutation (`xs.append(3)`) is visible through every
//! alias of the same name, matching the source language's reference
//! semantics for mutable containers. Slots are never shared across threads;
//! one sandbox evaluation runs on a single thread (the `rayon` parallel-map
//! builtin only ever fans out host functions, never sandbox closures).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use agentrt_core::Value;

pub type Slot = Rc<RefCell<Value>>;

/// One layer of local bindings (a function call frame or the module's
/// top-level frame).
#[derive(Default)]
pub struct Frame {
    bindings: HashMap<String, Slot>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Slot> {
        self.bindings.get(name).cloned()
    }

    pub fn declare(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), Rc::new(RefCell::new(value)));
    }

    pub fn set_existing_or_declare(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.bindings.get(name) {
            *slot.borrow_mut() = value;
        } else {
            self.declare(name, value);
        }
    }

    pub fn snapshot(&self) -> indexmap::IndexMap<String, Value> {
        self.bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.borrow().clone()))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.bindings.keys()
    }

    /// Drop a binding entirely, excluding it from mutation-diff detection
    /// and `names()`/`snapshot()` iteration. Used to unwind a `with` block's
    /// ephemeral binding once its body finishes.
    pub fn remove(&mut self, name: &str) {
        self.bindings.remove(name);
    }
}

/// The scope chain in effect during one call: local frame, then the
/// enclosing closure capture (read-only, frozen at definition time), then
/// the module's top-level frame.
pub struct ScopeChain<'a> {
    pub local: &'a mut Frame,
    /// Closure capture of a function's defining scope, or `None` at module
    /// top level. Read-only: closures freeze their capture, so
    /// assigning through a captured name creates a new local binding rather
    /// than mutating the frozen snapshot, exactly like the source
    /// language's own closure-over-value semantics for non-`nonlocal` names
    /// (and `nonlocal` itself is forbidden syntax here).
    pub enclosing: Option<&'a indexmap::IndexMap<String, Value>>,
    pub module: &'a Frame,
}

impl<'a> ScopeChain<'a> {
    pub fn resolve(&self, name: &str) -> Option<Value> {
        if let Some(slot) = self.local.get(name) {
            return Some(slot.borrow().clone());
        }
        if let Some(enclosing) = self.enclosing {
            if let Some(v) = enclosing.get(name) {
                return Some(v.clone());
            }
        }
        if let Some(slot) = self.module.get(name) {
            return Some(slot.borrow().clone());
        }
        None
    }

    /// Resolve to the mutable slot itself, for in-place mutation of
    /// containers reached through a bare name (e.g. `xs.append(3)`).
    /// Only local and module frames hold real slots; a name found only in
    /// the frozen `enclosing` capture has no mutable slot; the caller must
    /// fall back to read-only resolution and, if it tries to mutate,
    /// observe the freeze.
    pub fn resolve_slot(&self, name: &str) -> Option<Slot> {
        if let Some(slot) = self.local.get(name) {
            return Some(slot);
        }
        self.module.get(name)
    }

    pub fn assign(&mut self, name: &str, value: Value) {
        self.local.set_existing_or_declare(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_shadows_module() {
        let mut module = Frame::new();
        module.declare("x", Value::Int(1));
        let mut local = Frame::new();
        local.declare("x", Value::Int(2));
        let chain = ScopeChain {
            local: &mut local,
            enclosing: None,
            module: &module,
        };
        assert_eq!(chain.resolve("x"), Some(Value::Int(2)));
    }

    #[test]
    fn falls_through_to_module_when_not_local() {
        let mut module = Frame::new();
        module.declare("y", Value::Int(9));
        let mut local = Frame::new();
        let chain = ScopeChain {
            local: &mut local,
            enclosing: None,
            module: &module,
        };
        assert_eq!(chain.resolve("y"), Some(Value::Int(9)));
    }

    #[test]
    fn mutation_through_slot_is_visible_via_alias() {
        let mut frame = Frame::new();
        frame.declare("xs", Value::Array(vec![Value::Int(1)]));
        let slot = frame.get("xs").unwrap();
        if let Value::Array(items) = &mut *slot.borrow_mut() {
            items.push(Value::Int(2));
        }
        assert_eq!(frame.get("xs").unwrap().borrow().clone(), Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn enclosing_capture_has_no_mutable_slot() {
        let mut enclosing = indexmap::IndexMap::new();
        enclosing.insert("z".to_string(), Value::Int(5));
        let module = Frame::new();
        let mut local = Frame::new();
        let chain = ScopeChain {
            local: &mut local,
            enclosing: Some(&enclosing),
            module: &module,
        };
        assert_eq!(chain.resolve("z"), Some(Value::Int(5)));
        assert!(chain.resolve_slot("z").is_none());
    }
}
