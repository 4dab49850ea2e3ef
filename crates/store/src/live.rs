use std::collections::HashMap;

use agentrt_core::{Namespace, Value};
use parking_lot::RwLock;

/// Non-versioned, in-process mutable map.
///
/// Satisfies the same read/write contract as [`crate::versioned::VersionedStore`]
/// minus `snapshot`/`checkout`. Unlike the versioned store this backend
/// never rejects a value: opaque handles and container identity survive
/// across turns within one process precisely because nothing is ever
/// serialized. Callers who opt into Live mode are explicitly opting out of
/// rollback and cross-process durability.
#[derive(Default)]
pub struct LiveStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl LiveStore {
    /// An empty live store.
    pub fn new() -> Self {
        Self::default()
    }

    fn full_key(namespace: &Namespace, key: &str) -> String {
        if namespace.segments().is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", namespace.path(), key)
        }
    }

    /// Fetch the value bound to `key` within `namespace`, if any.
    pub fn get(&self, namespace: &Namespace, key: &str) -> Option<Value> {
        self.entries.read().get(&Self::full_key(namespace, key)).cloned()
    }

    /// Whether `key` is currently bound within `namespace`.
    pub fn has(&self, namespace: &Namespace, key: &str) -> bool {
        self.entries.read().contains_key(&Self::full_key(namespace, key))
    }

    /// Bind `key` to `value` within `namespace`, in place. No persistability
    /// check: a non-snapshot-safe `Value::Host` is perfectly at home here.
    pub fn put(&self, namespace: &Namespace, key: &str, value: Value) {
        self.entries.write().insert(Self::full_key(namespace, key), value);
    }

    /// Remove the binding for `key` within `namespace`.
    pub fn delete(&self, namespace: &Namespace, key: &str) {
        self.entries.write().remove(&Self::full_key(namespace, key));
    }

    /// List keys (relative to `namespace`) beginning with `prefix`.
    pub fn keys(&self, namespace: &Namespace, prefix: &str) -> Vec<String> {
        let full_prefix = Self::full_key(namespace, prefix);
        let ns_prefix_len = if namespace.segments().is_empty() {
            0
        } else {
            namespace.path().len() + 1
        };
        self.entries
            .read()
            .keys()
            .filter(|k| k.starts_with(&full_prefix))
            .map(|k| k[ns_prefix_len..].to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_core::HostHandle;

    #[test]
    fn put_then_get_roundtrips() {
        let s = LiveStore::new();
        let ns = Namespace::for_agent("a");
        s.put(&ns, "x", Value::Int(1));
        assert_eq!(s.get(&ns, "x"), Some(Value::Int(1)));
    }

    #[test]
    fn non_persistable_host_handle_is_accepted() {
        let s = LiveStore::new();
        let ns = Namespace::for_agent("a");
        let handle = Value::Host(HostHandle {
                kind: "instance".into(),
                registered_name: "conn".into(),
                type_tag: "Connection".into(),
                live: None,
        })
            .mark_non_persistable();
        s.put(&ns, "conn", handle.clone());
        assert_eq!(s.get(&ns, "conn"), Some(handle));
    }

    #[test]
    fn sibling_namespaces_do_not_collide() {
        let s = LiveStore::new();
        let a = Namespace::for_agent("orchestrator").child("worker_a");
        let b = Namespace::for_agent("orchestrator").child("worker_b");
        s.put(&a, "result", Value::Int(1));
        s.put(&b, "result", Value::Int(2));
        assert_eq!(s.get(&a, "result"), Some(Value::Int(1)));
        assert_eq!(s.get(&b, "result"), Some(Value::Int(2)));
    }

    #[test]
    fn delete_removes_binding() {
        let s = LiveStore::new();
        let ns = Namespace::for_agent("a");
        s.put(&ns, "x", Value::Int(1));
        s.delete(&ns, "x");
        assert_eq!(s.get(&ns, "x"), None);
        assert!(!s.has(&ns, "x"));
    }

    #[test]
    fn keys_strips_namespace_prefix() {
        let s = LiveStore::new();
        let ns = Namespace::for_agent("a");
        s.put(&ns, "x1", Value::Int(1));
        s.put(&ns, "x2", Value::Int(2));
        let mut got = s.keys(&ns, "x");
        got.sort();
        assert_eq!(got, vec!["x1".to_string(), "x2".to_string()]);
    }
}
