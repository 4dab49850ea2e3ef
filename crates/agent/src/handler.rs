//! Event handler contract:
//! `on_event(Event) -> ()`, called synchronously on the task loop's own
//! thread. Exceptions are swallowed and logged internally; they never
//! affect task progress.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::event::Event;

/// Receives every event a task invocation (and its sub-agent calls) emits,
/// in wall-clock order.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// Call `handler.on_event(event)`, catching and logging any panic so a
/// misbehaving handler never interrupts the task loop.
pub(crate) fn dispatch(handler: Option<&dyn EventHandler>, event: &Event) {
    let Some(handler) = handler else { return };
    let outcome = catch_unwind(AssertUnwindSafe(|| handler.on_event(event)));
    if let Err(panic) = outcome {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "event handler panicked".to_string());
        tracing::warn!(event = ?event.kind, %message, "event handler panicked, ignoring");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use agentrt_core::{Namespace, Timestamp, Value};

    struct Panics;
    impl EventHandler for Panics {
        fn on_event(&self, _event: &Event) {
            panic!("boom");
        }
    }

    struct CountingHandler(std::sync::atomic::AtomicUsize);
    impl EventHandler for CountingHandler {
        fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    fn event() -> Event {
        Event {
            kind: EventKind::Output,
            timestamp: Timestamp::tick(),
            agent_name: "a".into(),
            namespace: Namespace::for_agent("a"),
            commit_hash: None,
            payload: Value::Null,
        }
    }

    #[test]
    fn panicking_handler_is_swallowed() {
        dispatch(Some(&Panics), &event());
    }

    #[test]
    fn handler_is_invoked() {
        let handler = CountingHandler(std::sync::atomic::AtomicUsize::new(0));
        dispatch(Some(&handler), &event());
        assert_eq!(handler.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn no_handler_is_a_no_op() {
        dispatch(None, &event());
    }
}
