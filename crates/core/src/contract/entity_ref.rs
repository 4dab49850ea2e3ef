use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Namespace;

/// Discriminates the keyspace a [`ValueRef`] addresses within the unified
/// store: the four primitive families this runtime actually has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeTag {
    /// A key written through the live (non-versioned) store or a committed
    /// key in the versioned store.
    Kv = 0x01,
    /// A registered capability (function, class, module, or instance).
    Registry = 0x02,
    /// An append-only event log entry.
    EventLog = 0x03,
    /// A commit in the versioned store's DAG.
    Commit = 0x04,
}

impl TypeTag {
    /// Stable byte discriminant, used when a flat byte-KV key needs to
    /// multiplex several primitive families into one keyspace.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a discriminant byte back into a tag.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Kv),
            0x02 => Some(Self::Registry),
            0x03 => Some(Self::EventLog),
            0x04 => Some(Self::Commit),
            _ => None,
        }
    }
}

/// Fully-qualified address of a stored value, for diagnostics and
/// introspection (not part of the current design's literal API, but every
/// value handled by this runtime is reachable through one of these).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueRef {
    /// Namespace the value lives under.
    pub namespace: Namespace,
    /// Which primitive family this key belongs to.
    pub type_tag: TypeTag,
    /// Key within that namespace/family.
    pub key: String,
}

impl ValueRef {
    /// Address a KV-family key.
    pub fn kv(namespace: Namespace, key: impl Into<String>) -> Self {
        Self {
            namespace,
            type_tag: TypeTag::Kv,
            key: key.into(),
        }
    }

    /// Address a registry-family entry.
    pub fn registry(namespace: Namespace, key: impl Into<String>) -> Self {
        Self {
            namespace,
            type_tag: TypeTag::Registry,
            key: key.into(),
        }
    }

    /// Address an event log entry by sequence number.
    pub fn event(namespace: Namespace, sequence: u64) -> Self {
        Self {
            namespace,
            type_tag: TypeTag::EventLog,
            key: sequence.to_string(),
        }
    }

    /// Address a commit by its hex-encoded hash.
    pub fn commit(namespace: Namespace, hash_hex: impl Into<String>) -> Self {
        Self {
            namespace,
            type_tag: TypeTag::Commit,
            key: hash_hex.into(),
        }
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}:{}", self.namespace, self.type_tag, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_byte_roundtrip() {
        for tag in [TypeTag::Kv, TypeTag::Registry, TypeTag::EventLog, TypeTag::Commit] {
            assert_eq!(TypeTag::from_byte(tag.as_byte()), Some(tag));
        }
    }

    #[test]
    fn value_ref_display_includes_namespace_and_key() {
        let ns = Namespace::for_agent("orchestrator");
        let r = ValueRef::kv(ns, "status");
        let s = r.to_string();
        assert!(s.contains("orchestrator"));
        assert!(s.contains("status"));
    }
}
