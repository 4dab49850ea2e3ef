//! Core addressing types for the agent runtime
//!
//! This module defines the foundational identifiers and addressing types
//! used throughout the system:
//! - `AgentFingerprint`: stable identity for a registered agent
//! - `TaskId`: identity of a single task invocation (think-act loop run)
//! - `Namespace`: hierarchical path isolating an agent's (and its
//! sub-agents') subtree of keys within a versioned store
//! - `CommitHash`: content address of a store snapshot

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Stable identity for a registered agent.
///
/// An `AgentFingerprint` is a wrapper around a UUID v4. Agents are immutable
/// after their first task invocation; the
/// fingerprint is assigned once at registration time and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentFingerprint(Uuid);

impl AgentFingerprint {
    /// Create a new random fingerprint.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive a deterministic fingerprint from an agent's name.
    ///
    /// Used so that two `Agent` configurations built with the same name in
    /// the same process compare equal, which keeps sub-agent dispatch and
    /// test fixtures predictable without requiring the caller to thread a
    /// fingerprint through by hand.
    pub fn from_name(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"agentrt.fingerprint.v1");
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for AgentFingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single task invocation (one top-level think-act loop run).
///
/// Sub-agent dispatches created during the same top-level task share the
/// parent's `TaskId` lineage via [`Namespace`] nesting, not via `TaskId`
/// itself — `TaskId` identifies the *top-level* call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new random task id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hierarchical namespace: an ordered path of segments.
///
/// Identifies a subtree of keys within a [`agentrt_store`]-style versioned
/// store. Example: `orchestrator/worker_a`.
/// Namespaces provide per-agent isolation: a write under `a/b` never
/// observes or collides with a write under `a/c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// The empty (root) namespace.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Build a namespace from explicit segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Build a namespace for a top-level agent by name.
    pub fn for_agent(name: &str) -> Self {
        Self {
            segments: vec![name.to_string()],
        }
    }

    /// Derive a child namespace by appending a segment (e.g. a sub-agent
    /// binding name). Sibling children never share a key prefix.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The deepest segment, if any (used to attribute events to "the
    /// deepest namespace of the writer").
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// Segments as a slice.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Render as a `/`-joined path, used as the literal key prefix in the
    /// backing store.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Whether `other` is this namespace or a descendant of it.
    pub fn contains(&self, other: &Namespace) -> bool {
        other.segments.len() >= self.segments.len() && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Content address of a store snapshot.
///
/// Hex-encoded SHA-256 digest of the commit's canonical byte encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    /// Wrap a raw 32-byte digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash arbitrary bytes into a `CommitHash`.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex string representation, used as the on-disk / byte-KV key.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }

    /// Parse from a hex string as produced by [`CommitHash::to_hex`].
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut out = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let byte_str = std::str::from_utf8(chunk).ok()?;
            out[i] = u8::from_str_radix(byte_str, 16).ok()?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push(HEX[(b >> 4) as usize] as char);
        s.push(HEX[(b & 0x0f) as usize] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_from_name_is_deterministic() {
        let a = AgentFingerprint::from_name("researcher");
        let b = AgentFingerprint::from_name("researcher");
        assert_eq!(a, b);
        let c = AgentFingerprint::from_name("writer");
        assert_ne!(a, c);
    }

    #[test]
    fn namespace_child_isolation() {
        let root = Namespace::for_agent("orchestrator");
        let a = root.child("worker_a");
        let b = root.child("worker_b");
        assert_ne!(a.path(), b.path());
        assert!(root.contains(&a));
        assert!(!a.contains(&b));
    }

    #[test]
    fn namespace_path_rendering() {
        let ns = Namespace::for_agent("orchestrator").child("worker_a");
        assert_eq!(ns.path(), "orchestrator/worker_a");
        assert_eq!(ns.leaf(), Some("worker_a"));
    }

    #[test]
    fn commit_hash_hex_roundtrip() {
        let h = CommitHash::of(b"hello world");
        let hex = h.to_hex();
        let parsed = CommitHash::from_hex(&hex).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn commit_hash_differs_by_content() {
        let a = CommitHash::of(b"a");
        let b = CommitHash::of(b"b");
        assert_ne!(a, b);
    }
}
