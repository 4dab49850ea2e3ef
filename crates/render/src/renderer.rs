//! Builds the oracle's input message sequence.
//!
//! Renders four elements, in order: the agent's primer, its whitelisted
//! capabilities (filtered by visibility), the current turn's event/state
//! diff, and the task signature being driven. The whole thing obeys a
//! token budget by dropping lowest-priority content first: low-visibility
//! capabilities never appear at all, medium-visibility capabilities are
//! dropped next, then the oldest events.

use agentrt_registry::{CapabilityDescription, Registry, Visibility};

use crate::budget::estimate_message_tokens;
use crate::event_view::RenderEvent;
use crate::message::Message;
use crate::task::TaskSignature;

const DEFAULT_PRIMER: &str = "You are an autonomous agent operating inside a sandboxed interpreter.";

/// Render one oracle call's input messages. Deterministic: identical
/// `primer`/`registry`/`events`/`task`/`max_tokens` always produce the same
/// message sequence.
pub fn render(
    primer: Option<&str>,
    registry: &Registry,
    events: &[RenderEvent],
    task: &TaskSignature,
    max_tokens: usize,
) -> Vec<Message> {
    let mut capabilities = registry.describe_filtered(Visibility::Medium);
    let mut events: Vec<RenderEvent> = events.to_vec();

    loop {
        let messages = build_messages(primer, &capabilities, &events, task);
        if estimate_message_tokens(&messages) <= max_tokens {
            return messages;
        }
        if let Some(idx) = capabilities.iter().rposition(|c| c.visibility == Visibility::Medium) {
            capabilities.remove(idx);
            continue;
        }
        if !events.is_empty() {
            events.remove(0);
            continue;
        }
        // Nothing lower-priority left to drop: primer and task signature
        // are never trimmed, so this is as small as it gets.
        return messages;
    }
}

fn build_messages(
    primer: Option<&str>,
    capabilities: &[CapabilityDescription],
    events: &[RenderEvent],
    task: &TaskSignature,
) -> Vec<Message> {
    let mut out = Vec::with_capacity(4);
    out.push(Message::system(primer.unwrap_or(DEFAULT_PRIMER)));
    out.push(Message::system(render_capabilities(capabilities)));
    if !events.is_empty() {
        out.push(Message::user(render_events(events)));
    }
    out.push(Message::user(task.render_line()));
    out
}

fn render_capabilities(capabilities: &[CapabilityDescription]) -> String {
    if capabilities.is_empty() {
        return "No capabilities are registered.".to_string();
    }
    let mut lines = vec!["Available capabilities:".to_string()];
    for cap in capabilities {
        let mut line = format!("- {} ({})", cap.name, cap.kind);
        if let Some(sig) = &cap.signature {
            line.push_str(": ");
            line.push_str(sig);
        }
        if cap.visibility == Visibility::High {
            if let Some(doc) = &cap.docstring {
                line.push_str(" -- ");
                line.push_str(doc);
            }
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn render_events(events: &[RenderEvent]) -> String {
    let mut lines = vec!["Recent events:".to_string()];
    lines.extend(events.iter().map(RenderEvent::render_line));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_view::RenderEventKind;
    use agentrt_core::Value;
    use agentrt_registry::{FunctionEntry, HostFn};
    use std::sync::Arc;

    fn identity_fn() -> HostFn {
        Arc::new(|args: &[Value]| Ok(args.first().cloned().unwrap_or(Value::Null)))
    }

    fn task() -> TaskSignature {
        TaskSignature {
            name: "solve".into(),
            args: vec![("goal".into(), Value::Str("find x".into()))],
            return_type: Some("int".into()),
        }
    }

    #[test]
    fn low_visibility_capabilities_never_appear() {
        let mut reg = Registry::new();
        reg.register_function(
            "secret",
            FunctionEntry::new(identity_fn(), "secret(x)").with_visibility(Visibility::Low),
        );
        let messages = render(None, &reg, &[], &task(), 10_000);
        assert!(!messages.iter().any(|m| m.content.contains("secret")));
    }

    #[test]
    fn medium_visibility_hides_docstring_high_shows_it() {
        let mut reg = Registry::new();
        reg.register_function(
            "square",
            FunctionEntry::new(identity_fn(), "square(x: int) -> int")
                .with_visibility(Visibility::Medium)
                .with_docstring("squares a number"),
        );
        reg.register_function(
            "cube",
            FunctionEntry::new(identity_fn(), "cube(x: int) -> int")
                .with_visibility(Visibility::High)
                .with_docstring("cubes a number"),
        );
        let messages = render(None, &reg, &[], &task(), 10_000);
        let capability_block = messages[1].content.clone();
        assert!(capability_block.contains("square(x: int) -> int"));
        assert!(!capability_block.contains("squares a number"));
        assert!(capability_block.contains("cube(x: int) -> int"));
        assert!(capability_block.contains("cubes a number"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut reg = Registry::new();
        reg.register_function("f", FunctionEntry::new(identity_fn(), "f(x)"));
        let a = render(Some("primer"), &reg, &[], &task(), 10_000);
        let b = render(Some("primer"), &reg, &[], &task(), 10_000);
        assert_eq!(a, b);
    }

    #[test]
    fn tight_budget_drops_medium_capabilities_before_events() {
        let mut reg = Registry::new();
        reg.register_function(
            "f",
            FunctionEntry::new(identity_fn(), "f(x)").with_visibility(Visibility::Medium),
        );
        let events = vec![RenderEvent {
                kind: RenderEventKind::Output,
                timestamp: 1,
                agent_name: "a".into(),
                namespace: "a".into(),
                commit_hash: None,
                summary: "previous observation".into(),
        }];
        let generous = render(None, &reg, &events, &task(), 10_000);
        assert!(generous.iter().any(|m| m.content.contains("f(x)")));
        assert!(generous.iter().any(|m| m.content.contains("previous observation")));

        // Budget tight enough to force at least one drop, but loose enough
        // that the task/primer messages always survive.
        let tight = render(None, &reg, &events, &task(), 30);
        let capability_block = &tight[1].content;
        assert!(!capability_block.contains("f(x)"));
    }

    #[test]
    fn oldest_events_drop_first() {
        let reg = Registry::new();
        let events = vec![
            RenderEvent {
                kind: RenderEventKind::Action,
                timestamp: 1,
                agent_name: "a".into(),
                namespace: "a".into(),
                commit_hash: None,
                summary: "oldest".into(),
            },
            RenderEvent {
                kind: RenderEventKind::Action,
                timestamp: 2,
                agent_name: "a".into(),
                namespace: "a".into(),
                commit_hash: None,
                summary: "newest".into(),
            },
        ];
        let messages = render(None, &reg, &events, &task(), 40);
        let joined: String = messages.iter().map(|m| m.content.clone()).collect();
        if joined.contains("newest") {
            assert!(!joined.contains("oldest"));
        }
    }
}
