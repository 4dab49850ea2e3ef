use agentrt_core::{CommitHash, Namespace, Value};

use crate::error::StoreError;
use crate::versioned::VersionedStore;

/// A read-only, namespace-scoped window into a single commit of a
/// [`VersionedStore`].
///
/// Keys are transparently prefixed with the namespace's path, so a view
/// rooted at `orchestrator/worker_a` never sees (or can collide with) a key
/// written under `orchestrator/worker_b` — sibling isolation is enforced
/// purely by key prefixing over one shared global commit state, not by
/// separate underlying stores.
pub struct NamespacedView<'a> {
    store: &'a VersionedStore,
    commit: CommitHash,
    namespace: Namespace,
}

impl<'a> NamespacedView<'a> {
    /// Build a view over `commit`, scoped to `namespace`.
    pub fn new(store: &'a VersionedStore, commit: CommitHash, namespace: Namespace) -> Self {
        Self {
            store,
            commit,
            namespace,
        }
    }

    /// The namespace this view is scoped to.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn full_key(&self, key: &str) -> String {
        if self.namespace.segments().is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.namespace.path(), key)
        }
    }

    /// Fetch the value bound to `key` within this namespace at this commit.
    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let commit = self.store.checkout(self.commit)?;
        Ok(commit.state.get(&self.full_key(key)).cloned())
    }

    /// List keys (relative to this namespace) beginning with `prefix`.
    pub fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let commit = self.store.checkout(self.commit)?;
        let full_prefix = self.full_key(prefix);
        let ns_prefix_len = if self.namespace.segments().is_empty() {
            0
        } else {
            self.namespace.path().len() + 1
        };
        Ok(commit
                .state
                .keys()
                .filter(|k| k.starts_with(&full_prefix))
                .map(|k| k[ns_prefix_len..].to_string())
                .collect())
    }

    /// Derive a view scoped to a child namespace (e.g. a sub-agent's
    /// subtree) at the same commit.
    pub fn child(&self, segment: impl Into<String>) -> NamespacedView<'a> {
        NamespacedView::new(self.store, self.commit, self.namespace.child(segment))
    }

    /// The commit this view is pinned to.
    pub fn commit_hash(&self) -> CommitHash {
        self.commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_kv::MemoryStore;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn store() -> VersionedStore {
        VersionedStore::new(Arc::new(MemoryStore::default())).unwrap()
    }

    #[test]
    fn sibling_namespaces_do_not_collide() {
        let s = store();
        let ns_a = Namespace::for_agent("orchestrator").child("worker_a");
        let ns_b = Namespace::for_agent("orchestrator").child("worker_b");

        let mut writes = BTreeMap::new();
        writes.insert(format!("{}/result", ns_a.path()), Some(Value::Int(1)));
        writes.insert(format!("{}/result", ns_b.path()), Some(Value::Int(2)));
        let h = s.commit(s.root(), Namespace::root(), writes).unwrap();

        let view_a = NamespacedView::new(&s, h, ns_a);
        let view_b = NamespacedView::new(&s, h, ns_b);
        assert_eq!(view_a.get("result").unwrap(), Some(Value::Int(1)));
        assert_eq!(view_b.get("result").unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn child_view_scopes_correctly() {
        let s = store();
        let root_ns = Namespace::for_agent("orchestrator");
        let mut writes = BTreeMap::new();
        writes.insert("orchestrator/worker_a/x".to_string(), Some(Value::Int(5)));
        let h = s.commit(s.root(), Namespace::root(), writes).unwrap();

        let view = NamespacedView::new(&s, h, root_ns);
        let child = view.child("worker_a");
        assert_eq!(child.get("x").unwrap(), Some(Value::Int(5)));
    }

    #[test]
    fn scan_prefix_strips_namespace() {
        let s = store();
        let ns = Namespace::for_agent("a");
        let mut writes = BTreeMap::new();
        writes.insert("a/x1".to_string(), Some(Value::Int(1)));
        writes.insert("a/x2".to_string(), Some(Value::Int(2)));
        let h = s.commit(s.root(), Namespace::root(), writes).unwrap();
        let view = NamespacedView::new(&s, h, ns);
        let mut got = view.scan_prefix("x").unwrap();
        got.sort();
        assert_eq!(got, vec!["x1".to_string(), "x2".to_string()]);
    }
}
