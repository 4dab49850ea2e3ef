//! The oracle contract: `complete(messages) -> (thinking,
//! code)`. This is the only seam between the task loop and an actual LLM;
//! wire protocols for any specific provider are out of scope.

use thiserror::Error;

use agentrt_render::Message;

/// Drives one "think, then act" step: given the rendered message sequence,
/// return the model's reasoning text and the code fragment to execute.
pub trait Oracle: Send + Sync {
    fn complete(&self, messages: &[Message]) -> Result<(String, String), OracleError>;
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle returned a malformed response: {0}")]
    Format(String),
}
