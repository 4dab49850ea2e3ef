//! Flattened event view the renderer consumes.
//!
//! `agentrt-agent` owns the real, richly-typed `Event` (it carries a
//! `Value` payload and a `CommitHash`); this crate only needs a
//! already-stringified projection of it, so `RenderEvent` lives here rather
//! than pulling `agentrt-agent` in as a dependency (which would cycle back
//! through this crate). `agentrt-agent::Event::render_view` produces one of
//! these per event.

/// Which kind of turn event this is, mirroring`Event.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEventKind {
    TaskStart,
    Action,
    Output,
    Success,
    Fail,
    Clarify,
}

impl RenderEventKind {
    pub fn label(self) -> &'static str {
        match self {
            RenderEventKind::TaskStart => "task-start",
            RenderEventKind::Action => "action",
            RenderEventKind::Output => "output",
            RenderEventKind::Success => "success",
            RenderEventKind::Fail => "fail",
            RenderEventKind::Clarify => "clarify",
        }
    }
}

/// One already-stringified event, ready to fold into the rendered state
/// diff. `commit_hash` is `None` for events emitted during a turn that
/// never produced a commit (e.g. a forbidden-call observation).
#[derive(Debug, Clone)]
pub struct RenderEvent {
    pub kind: RenderEventKind,
    pub timestamp: u64,
    pub agent_name: String,
    pub namespace: String,
    pub commit_hash: Option<String>,
    pub summary: String,
}

impl RenderEvent {
    /// One rendered line, e.g. `"[t4] worker/output: division by zero"`.
    pub fn render_line(&self) -> String {
        match &self.commit_hash {
            Some(hash) => format!(
                "[t{} {}] {}/{}: {} (commit {})",
                self.timestamp,
                hash_prefix(hash),
                self.namespace,
                self.kind.label(),
                self.summary,
                hash,
            ),
            None => format!(
                "[t{}] {}/{}: {}",
                self.timestamp, self.namespace, self.kind.label(), self.summary
            ),
        }
    }
}

fn hash_prefix(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_line_includes_commit_when_present() {
        let ev = RenderEvent {
            kind: RenderEventKind::Action,
            timestamp: 1,
            agent_name: "worker".into(),
            namespace: "orchestrator/worker".into(),
            commit_hash: Some("a".repeat(64)),
            summary: "x = 1".into(),
        };
        let line = ev.render_line();
        assert!(line.contains("action"));
        assert!(line.contains("commit"));
    }

    #[test]
    fn render_line_omits_commit_when_absent() {
        let ev = RenderEvent {
            kind: RenderEventKind::Output,
            timestamp: 2,
            agent_name: "worker".into(),
            namespace: "orchestrator/worker".into(),
            commit_hash: None,
            summary: "name 'y' is not defined".into(),
        };
        assert!(!ev.render_line().contains("commit"));
    }
}
