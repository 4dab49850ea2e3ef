//! Context renderer: turns an agent's primer, whitelisted capabilities,
//! event log, and task signature into the oracle's input message sequence
//!.

pub mod budget;
pub mod event_view;
pub mod message;
pub mod renderer;
pub mod task;

pub use budget::{estimate_message_tokens, estimate_tokens};
pub use event_view::{RenderEvent, RenderEventKind};
pub use message::{Message, Role};
pub use renderer::render;
pub use task::TaskSignature;
