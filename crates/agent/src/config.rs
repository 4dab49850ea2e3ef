//! Agent configuration.

use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;
const DEFAULT_MAX_ITERATIONS: usize = 10;
const DEFAULT_MAX_TOKENS: usize = 4_096;
const DEFAULT_LLM_MAX_RETRIES: usize = 2;
const DEFAULT_LLM_RETRY_BACKOFF: f64 = 0.5;

/// The options an operator configures when defining an agent:
/// `primer`, `timeout_seconds`, `max_iterations`, `max_tokens`, `name`,
/// `llm_max_retries`, `llm_retry_backoff`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub primer: Option<String>,
    pub timeout_seconds: f64,
    pub max_iterations: usize,
    pub max_tokens: usize,
    pub name: Option<String>,
    pub llm_max_retries: usize,
    pub llm_retry_backoff: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            primer: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: DEFAULT_MAX_TOKENS,
            name: None,
            llm_max_retries: DEFAULT_LLM_MAX_RETRIES,
            llm_retry_backoff: DEFAULT_LLM_RETRY_BACKOFF,
        }
    }
}

impl AgentConfig {
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Build a config from `AGENTRT_*` environment variables, falling back
    /// to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            primer: std::env::var("AGENTRT_PRIMER").ok(),
            timeout_seconds: env_parsed("AGENTRT_TIMEOUT_SECONDS", defaults.timeout_seconds),
            max_iterations: env_parsed("AGENTRT_MAX_ITERATIONS", defaults.max_iterations),
            max_tokens: env_parsed("AGENTRT_MAX_TOKENS", defaults.max_tokens),
            name: std::env::var("AGENTRT_NAME").ok(),
            llm_max_retries: env_parsed("AGENTRT_LLM_MAX_RETRIES", defaults.llm_max_retries),
            llm_retry_backoff: env_parsed("AGENTRT_LLM_RETRY_BACKOFF", defaults.llm_retry_backoff),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Builder for [`AgentConfig`], following the same chained-setter style as
/// the other crates' entry builders (e.g. `FunctionEntry::with_visibility`).
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    pub fn primer(mut self, primer: impl Into<String>) -> Self {
        self.config.primer = Some(primer.into());
        self
    }

    pub fn timeout_seconds(mut self, seconds: f64) -> Self {
        self.config.timeout_seconds = seconds;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn max_tokens(mut self, max: usize) -> Self {
        self.config.max_tokens = max;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    pub fn llm_max_retries(mut self, retries: usize) -> Self {
        self.config.llm_max_retries = retries;
        self
    }

    pub fn llm_retry_backoff(mut self, seconds: f64) -> Self {
        self.config.llm_retry_backoff = seconds;
        self
    }

    pub fn build(self) -> AgentConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = AgentConfig::builder()
            .name("orchestrator")
            .max_iterations(5)
            .llm_max_retries(1)
            .build();
        assert_eq!(cfg.name.as_deref(), Some("orchestrator"));
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.llm_max_retries, 1);
        assert_eq!(cfg.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn from_env_falls_back_to_defaults_when_unset() {
        std::env::remove_var("AGENTRT_MAX_ITERATIONS");
        let cfg = AgentConfig::from_env();
        assert_eq!(cfg.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn from_env_parses_set_variables() {
        std::env::set_var("AGENTRT_MAX_ITERATIONS", "7");
        let cfg = AgentConfig::from_env();
        assert_eq!(cfg.max_iterations, 7);
        std::env::remove_var("AGENTRT_MAX_ITERATIONS");
    }
}
