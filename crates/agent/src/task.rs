//! The `Task` entity: `{agent, name, parameter_list,
//! return_type, primer, parent_task?}`.

use agentrt_core::{AgentFingerprint, TaskId, Value};

/// One task invocation's declaration: which agent is driving it, its
/// parameter/return shape, an optional task-specific primer override, and
/// (for sub-agent dispatches) the parent task that spawned it.
#[derive(Debug, Clone)]
pub struct Task {
    pub agent: AgentFingerprint,
    pub name: String,
    pub parameter_list: Vec<String>,
    pub return_type: Option<String>,
    pub primer: Option<String>,
    pub parent_task: Option<TaskId>,
}

impl Task {
    pub fn new(agent: AgentFingerprint, name: impl Into<String>) -> Self {
        Self {
            agent,
            name: name.into(),
            parameter_list: Vec::new(),
            return_type: None,
            primer: None,
            parent_task: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameter_list = parameters;
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_primer(mut self, primer: impl Into<String>) -> Self {
        self.primer = Some(primer.into());
        self
    }

    pub fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent_task = Some(parent);
        self
    }
}
