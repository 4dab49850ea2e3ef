//! Commit/checkout round trips and namespace isolation across the
//! versioned store and its session/namespaced-view wrappers.

use std::collections::BTreeMap;
use std::sync::Arc;

use agentrt_core::{Namespace, Value};
use agentrt_kv::MemoryStore;
use agentrt_store::{NamespacedView, VersionedSession, VersionedStore};

fn store() -> Arc<VersionedStore> {
    Arc::new(VersionedStore::new(Arc::new(MemoryStore::default())).unwrap())
}

#[test]
fn checkout_of_a_fresh_commit_returns_the_same_state() {
    let store = store();
    let ns = Namespace::for_agent("writer");
    let mut writes = BTreeMap::new();
    writes.insert("x".to_string(), Some(Value::Int(42)));
    let hash = store.commit(store.root(), ns.clone(), writes).unwrap();

    let commit = store.checkout(hash).unwrap();
    assert_eq!(commit.state.get("x"), Some(&Value::Int(42)));

    let again = store.checkout(hash).unwrap();
    assert_eq!(commit.state, again.state);
}

#[test]
fn no_op_write_returns_the_base_hash_unchanged() {
    let store = store();
    let ns = Namespace::for_agent("writer");
    let mut writes = BTreeMap::new();
    writes.insert("x".to_string(), Some(Value::Int(1)));
    let hash = store.commit(store.root(), ns.clone(), writes.clone()).unwrap();
    let repeat = store.commit(hash, ns, writes).unwrap();
    assert_eq!(hash, repeat);
}

#[test]
fn history_tracks_only_commits_that_changed_the_key() {
    let store = store();
    let ns = Namespace::for_agent("writer");

    let mut w1 = BTreeMap::new();
    w1.insert("x".to_string(), Some(Value::Int(1)));
    let h1 = store.commit(store.root(), ns.clone(), w1).unwrap();

    let mut w2 = BTreeMap::new();
    w2.insert("y".to_string(), Some(Value::Int(99)));
    let h2 = store.commit(h1, ns.clone(), w2).unwrap();

    let mut w3 = BTreeMap::new();
    w3.insert("x".to_string(), Some(Value::Int(2)));
    let h3 = store.commit(h2, ns, w3).unwrap();

    let history = store.history(h3, "x").unwrap();
    assert_eq!(history, vec![h3, h1]);
}

#[test]
fn versioned_session_persists_mutations_across_turns() {
    let store = store();
    let session = VersionedSession::new(store.clone());
    let ns = Namespace::for_agent("agent-a");

    session.put(&ns, "counter", Value::Int(1)).unwrap();
    let first_snapshot = session.snapshot();
    session.put(&ns, "counter", Value::Int(2)).unwrap();
    let second_snapshot = session.snapshot();

    assert_ne!(first_snapshot, second_snapshot);
    assert_eq!(session.get(&ns, "counter").unwrap(), Some(Value::Int(2)));

    let at_first = store.checkout(first_snapshot).unwrap();
    assert_eq!(at_first.state.get(&format!("{}/counter", ns.path())), Some(&Value::Int(1)));
}

#[test]
fn sibling_namespaces_are_isolated_under_a_shared_commit() {
    let store = store();
    let ns_a = Namespace::for_agent("agent-a");
    let ns_b = ns_a.child("sub-agent-b");

    let mut writes = BTreeMap::new();
    writes.insert(format!("{}/secret", ns_a.path()), Some(Value::Int(7)));
    let hash = store.commit(store.root(), ns_a.clone(), writes).unwrap();

    let view_a = NamespacedView::new(&store, hash, ns_a);
    let view_b = NamespacedView::new(&store, hash, ns_b);

    assert_eq!(view_a.get("secret").unwrap(), Some(Value::Int(7)));
    assert_eq!(view_b.get("secret").unwrap(), None);
}
