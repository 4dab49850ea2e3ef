//! Append-only event log.
//!
//! Exposes `range`/`head` read views over the append-only sequence rather
//! than a bare `Vec<Event>`: external operators and the task loop's own
//! render step both read through these views.

use parking_lot::RwLock;

use crate::event::Event;

/// An in-process, append-only sequence of [`Event`]s for one top-level
/// task invocation (including everything its sub-agent calls emit).
#[derive(Default)]
pub struct EventLog {
    events: RwLock<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event. Never removes or reorders existing entries.
    pub fn append(&self, event: Event) {
        self.events.write().push(event);
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recent `n` events, oldest first.
    pub fn head(&self, n: usize) -> Vec<Event> {
        let events = self.events.read();
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Events in `[start, end)`, clamped to the log's current length.
    pub fn range(&self, start: usize, end: usize) -> Vec<Event> {
        let events = self.events.read();
        let end = end.min(events.len());
        if start >= end {
            return Vec::new();
        }
        events[start..end].to_vec()
    }

    /// Every event recorded so far, oldest first.
    pub fn all(&self) -> Vec<Event> {
        self.events.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use agentrt_core::{Namespace, Timestamp, Value};

    fn event(summary: &str) -> Event {
        Event {
            kind: EventKind::Output,
            timestamp: Timestamp::tick(),
            agent_name: "a".into(),
            namespace: Namespace::for_agent("a"),
            commit_hash: None,
            payload: Value::Str(summary.into()),
        }
    }

    #[test]
    fn append_and_len() {
        let log = EventLog::new();
        log.append(event("one"));
        log.append(event("two"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn head_returns_most_recent_oldest_first() {
        let log = EventLog::new();
        for s in ["one", "two", "three"] {
            log.append(event(s));
        }
        let last_two = log.head(2);
        assert_eq!(last_two.len(), 2);
        if let Value::Str(s) = &last_two[0].payload {
            assert_eq!(s, "two");
        }
    }

    #[test]
    fn range_clamps_to_log_length() {
        let log = EventLog::new();
        log.append(event("one"));
        assert_eq!(log.range(0, 100).len(), 1);
        assert_eq!(log.range(5, 10).len(), 0);
    }
}
