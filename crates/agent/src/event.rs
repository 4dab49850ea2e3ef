//! The append-only event record.

use agentrt_core::{CommitHash, Namespace, Timestamp, Value};
use agentrt_render::{RenderEvent, RenderEventKind};

/// `kind ∈ {task-start, action, output, success, fail, clarify}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TaskStart,
    Action,
    Output,
    Success,
    Fail,
    Clarify,
}

impl EventKind {
    fn render_kind(self) -> RenderEventKind {
        match self {
            EventKind::TaskStart => RenderEventKind::TaskStart,
            EventKind::Action => RenderEventKind::Action,
            EventKind::Output => RenderEventKind::Output,
            EventKind::Success => RenderEventKind::Success,
            EventKind::Fail => RenderEventKind::Fail,
            EventKind::Clarify => RenderEventKind::Clarify,
        }
    }
}

/// One entry in the append-only event log: `{kind,
/// timestamp, agent_name, full_namespace, commit_hash?, payload}`.
///
/// `commit_hash` is `None` when the turn that produced this event never
/// produced a commit — either the state mode was `None`/`Live`, or the
/// turn's evaluation failed before `flush_dirty_state` ran.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: Timestamp,
    pub agent_name: String,
    pub namespace: Namespace,
    pub commit_hash: Option<CommitHash>,
    pub payload: Value,
}

impl Event {
    /// Project this event into the lightweight, already-stringified shape
    /// the Context Renderer consumes.
    pub fn render_view(&self) -> RenderEvent {
        RenderEvent {
            kind: self.kind.render_kind(),
            timestamp: self.timestamp.raw(),
            agent_name: self.agent_name.clone(),
            namespace: self.namespace.path(),
            commit_hash: self.commit_hash.map(|h| h.to_hex()),
            summary: summarize(&self.payload),
        }
    }
}

/// A plain-text summary of an event payload, good enough for the renderer
/// and for a human skimming an event log. Not a general-purpose value
/// formatter; it only needs to be legible, not round-trippable.
fn summarize(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::Bytes(b) => format!("<{} bytes>", b.len()),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Tuple(items) => format!("({} items)", items.len()),
        Value::Map(m) => format!("{{{} keys}}", m.len()),
        Value::Set(items) => format!("{{{} items}}", items.len()),
        Value::Record { type_tag, fields } => {
            format!("{}{{{} fields}}", type_tag.as_deref().unwrap_or("record"), fields.len())
        }
        Value::Function(f) => format!("<function {}>", f.name.as_deref().unwrap_or("anonymous")),
        Value::Host(h) => format!("<{} {}>", h.type_tag, h.registered_name),
        Value::Type(t) => format!("<type {}>", t.name),
        Value::Agent(fp) => format!("<agent {}>", fp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_view_carries_namespace_and_timestamp() {
        let event = Event {
            kind: EventKind::Output,
            timestamp: Timestamp::tick(),
            agent_name: "worker".into(),
            namespace: Namespace::for_agent("worker"),
            commit_hash: None,
            payload: Value::Str("hello".into()),
        };
        let view = event.render_view();
        assert_eq!(view.namespace, "worker");
        assert_eq!(view.summary, "hello");
        assert!(view.commit_hash.is_none());
    }
}
