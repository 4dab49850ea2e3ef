//! The `Agent` entity: `{fingerprint, name, primer,
//! timeout, max_iterations, token_budget, registry}`. Immutable after its
//! first task invocation — nothing in this type enforces that itself (the
//! same convention `Registry`'s own doc comment states); `TaskLoop` never
//! hands out `&mut Agent` once a task has run.

use std::sync::Arc;

use agentrt_core::AgentFingerprint;
use agentrt_registry::Registry;

use crate::config::AgentConfig;
use crate::oracle::Oracle;

pub struct Agent {
    pub fingerprint: AgentFingerprint,
    pub name: String,
    pub primer: Option<String>,
    pub config: AgentConfig,
    pub registry: Registry,
    pub oracle: Arc<dyn Oracle>,
}

impl Agent {
    /// Construct an agent and hand back a shared handle, since every
    /// consumer of an `Agent` (a `TaskLoop`, a sub-agent binding) needs to
    /// hold it jointly.
    pub fn new(name: impl Into<String>, config: AgentConfig, registry: Registry, oracle: Arc<dyn Oracle>) -> Arc<Self> {
        let name = name.into();
        let primer = config.primer.clone();
        Arc::new(Self {
                fingerprint: AgentFingerprint::from_name(&name),
                name,
                primer,
                config,
                registry,
                oracle,
        })
    }
}
