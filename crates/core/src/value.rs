//! Unified value model for the sandbox interpreter
//!
//! Every value the interpreter manipulates belongs to one of the tagged
//! variants below. The union is closed by design;
//! reflection over a value's shape is restricted to what this enum exposes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::types::AgentFingerprint;

/// Canonical, order-independent wire form for the model's maps: sorted
/// `(key, value)` pairs rather than `IndexMap`'s default insertion-order
/// sequence, so two structurally-equal maps built in different insertion
/// order always serialize to the same bytes. Required for content
/// addressing (`Commit::content_hash` hashes this exact serialized form)
/// and for the "identical values share storage" property it rests on.
mod canonical_map {
    use super::{IndexMap, Value};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        map: &IndexMap<String, Value>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&String, &Value)> = map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<String, Value>, D::Error> {
        let entries = Vec::<(String, Value)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

/// Canonical wire form for `f64`: every NaN bit pattern normalizes to the
/// same representation before hashing, per the determinism requirement on
/// float fields.
mod canonical_float {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(f: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let canonical = if f.is_nan() { f64::NAN } else { *f };
        serializer.serialize_f64(canonical)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer)
    }
}

/// A function captured by sandbox code: parameters plus a statement body,
/// frozen over a snapshot of its defining scope.
///
/// The body is represented as an opaque serialized AST blob here in
/// `agentrt-core` to avoid a dependency cycle with `agentrt-sandbox`, which
/// owns the actual AST types and knows how to decode/evaluate this blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxFunction {
    /// Parameter names, in declaration order.
    pub params: Vec<String>,
    /// Bincode-encoded statement body (an `agentrt_sandbox::ast::Block`).
    pub body: Vec<u8>,
    /// Snapshot of every enclosing name referenced by the body, captured by
    /// value at the end of the defining turn.
    #[serde(with = "canonical_map")]
    pub captured: IndexMap<String, Value>,
    /// Human-readable name, for error messages and renderer display.
    pub name: Option<String>,
}

impl PartialEq for SandboxFunction {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.body == other.body && self.name == other.name
    }
}

/// Descriptor carried by a live host object reference that cannot be
/// serialized directly.
///
/// On snapshot into a Versioned store this is what the handle degrades to;
/// resolving it back to the live object on load is the registry's job
///.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostHandle {
    /// Registry-assigned discriminator (e.g. `"instance"`, `"module"`).
    pub kind: String,
    /// The name this object was registered/bound under.
    pub registered_name: String,
    /// The host type name, for diagnostics and `is_instance_of` checks.
    pub type_tag: String,
    /// Opaque process-local handle; `None` once degraded by a snapshot and
    /// not yet re-resolved against a live registry.
    #[serde(skip)]
    pub live: Option<HostHandleId>,
}

impl PartialEq for HostHandleId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// Process-local identity for a live host object. Never serialized; the
/// degraded [`HostHandle`] descriptor is what crosses a snapshot boundary.
#[derive(Debug, Clone, Copy)]
pub struct HostHandleId(pub u64);

/// Reflective placeholder returned by the `type-of` builtin. Usable for equality/`is_instance_of` checks;
/// its members (`__bases__`, `__mro__`, etc.) are deliberately not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Canonical name of the type (host class name, or a primitive tag such
    /// as `"int"`, `"str"`, `"record:Point"`).
    pub name: String,
}

/// Unified value type for all primitives the sandbox manipulates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null / none.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(#[serde(with = "canonical_float")] f64),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered sequence (mutable, source-language `list`).
    Array(Vec<Value>),
    /// Ordered, fixed-length tuple (immutable once constructed).
    Tuple(Vec<Value>),
    /// Key → value mapping, insertion order preserved for iteration but
    /// serialized in sorted-key order (see `canonical_map`) for stable
    /// content hashing.
    Map(#[serde(with = "canonical_map")] IndexMap<String, Value>),
    /// Set of values (deduplicated by structural equality).
    Set(Vec<Value>),
    /// User record: named field set with an optional type tag, no
    /// inheritance.
    Record {
        /// Optional declared record-type name.
        type_tag: Option<String>,
        /// Named fields, insertion order preserved for iteration but
        /// serialized in sorted-key order (see `canonical_map`).
        #[serde(with = "canonical_map")]
        fields: IndexMap<String, Value>,
    },
    /// A sandbox-defined function, captured by snapshot.
    Function(SandboxFunction),
    /// A live host object reference (not directly serializable).
    Host(HostHandle),
    /// Reflective type placeholder.
    Type(TypeDescriptor),
    /// A stable reference naming a registered agent.
    Agent(AgentFingerprint),
}

impl Value {
    /// Whether this value (transitively) can be committed to a Versioned
    /// store without degradation failure.
    ///
    /// Opaque handles are only non-persistable once their `live` slot is
    /// gone *and* they refuse degradation; in this model every `Host`
    /// value can always degrade to its descriptor, so the only truly
    /// non-persistable values are ones containing a `Host` handle whose
    /// registry entry is marked `persistable: false` by the caller via
    /// [`Value::mark_non_persistable`]. We track that with a sentinel
    /// `type_tag` prefix rather than adding a field to every variant,
    /// keeping the wire format stable.
    pub fn is_snapshot_safe(&self) -> bool {
        match self {
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Bytes(_)
            | Value::Type(_)
            | Value::Agent(_) => true,
            Value::Array(items) | Value::Tuple(items) | Value::Set(items) => {
                items.iter().all(Value::is_snapshot_safe)
            }
            Value::Map(m) => m.values().all(Value::is_snapshot_safe),
            Value::Record { fields,.. } => fields.values().all(Value::is_snapshot_safe),
            Value::Function(f) => f.captured.values().all(Value::is_snapshot_safe),
            Value::Host(h) => h.kind != NON_PERSISTABLE_KIND,
        }
    }

    /// Mark a host handle as refusing degradation (used by registrations
    /// of resources that must stay ephemeral, e.g. open file handles).
    pub fn mark_non_persistable(mut self) -> Self {
        if let Value::Host(ref mut h) = self {
            h.kind = NON_PERSISTABLE_KIND.to_string();
        }
        self
    }

    /// A short type name, for error messages (`TypeMismatch`, etc).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Record {.. } => "record",
            Value::Function(_) => "function",
            Value::Host(_) => "host",
            Value::Type(_) => "type",
            Value::Agent(_) => "agent",
        }
    }

    /// Truthiness, following the source language's rules (empty container /
    /// zero / empty string / null are falsy).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::Array(a) | Value::Tuple(a) | Value::Set(a) => !a.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Record {.. } => true,
            Value::Function(_) | Value::Host(_) | Value::Type(_) | Value::Agent(_) => true,
        }
    }
}

const NON_PERSISTABLE_KIND: &str = "__non_persistable__";

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (
                Value::Record {
                    type_tag: ta,
                    fields: fa,
                },
                Value::Record {
                    type_tag: tb,
                    fields: fb,
                },
            ) => ta == tb && fa == fb,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Agent(a), Value::Agent(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Array(a) | Value::Tuple(a) | Value::Set(a) => a.hash(state),
            Value::Map(m) => {
                for (k, v) in m {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Record { type_tag, fields } => {
                type_tag.hash(state);
                for (k, v) in fields {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Function(f) => {
                f.params.hash(state);
                f.body.hash(state);
            }
            Value::Host(h) => {
                h.kind.hash(state);
                h.registered_name.hash(state);
            }
            Value::Type(t) => t.hash(state),
            Value::Agent(a) => a.hash(state),
        }
    }
}

/// Total ordering used for deterministic map-key sorting during
/// serialization.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) => 2,
                Value::Float(_) => 3,
                Value::Str(_) => 4,
                Value::Bytes(_) => 5,
                Value::Array(_) => 6,
                Value::Tuple(_) => 7,
                Value::Map(_) => 8,
                Value::Set(_) => 9,
                Value::Record {.. } => 10,
                Value::Function(_) => 11,
                Value::Host(_) => 12,
                Value::Type(_) => 13,
                Value::Agent(_) => 14,
            }
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_snapshot_safe() {
        assert!(Value::Int(1).is_snapshot_safe());
        assert!(Value::Array(vec![Value::Int(1), Value::Str("x".into())]).is_snapshot_safe());
    }

    #[test]
    fn non_persistable_host_handle_poisons_containers() {
        let handle = Value::Host(HostHandle {
                kind: "instance".into(),
                registered_name: "conn".into(),
                type_tag: "Connection".into(),
                live: None,
        })
            .mark_non_persistable();
        assert!(!handle.is_snapshot_safe());
        let wrapped = Value::Array(vec![handle]);
        assert!(!wrapped.is_snapshot_safe());
    }

    #[test]
    fn persistable_host_handle_degrades_cleanly() {
        let handle = Value::Host(HostHandle {
                kind: "instance".into(),
                registered_name: "judge".into(),
                type_tag: "Verdict".into(),
                live: None,
        });
        assert!(handle.is_snapshot_safe());
    }

    #[test]
    fn float_equality_uses_bit_pattern() {
        assert_eq!(Value::Float(1.0), Value::Float(1.0));
        assert_ne!(Value::Float(f64::NAN), Value::Float(1.0));
    }

    #[test]
    fn truthiness_matches_source_language_rules() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn serialization_roundtrip() {
        let mut fields = IndexMap::new();
        fields.insert("x".to_string(), Value::Int(1));
        let v = Value::Record {
            type_tag: Some("Point".into()),
            fields,
        };
        let bytes = bincode::serialize(&v).unwrap();
        let back: Value = bincode::deserialize(&bytes).unwrap();
        assert_eq!(v, back);
    }
}
