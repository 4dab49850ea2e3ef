//! Restricted-language lexer, parser, AST, and whitelist-enforcing
//! tree-walking evaluator.
//!
//! [`parser::parse`] turns source text into an [`ast::Block`];
//! [`eval::Interpreter::run`] executes one such block as a single agent
//! turn against a [`agentrt_store::StateHandle`] and an
//! [`agentrt_registry::Registry`] of whitelisted capabilities.

pub mod ast;
pub mod builtins;
pub mod control;
pub mod error;
pub mod eval;
pub mod fstring;
pub mod lexer;
pub mod parser;
pub mod scope;

pub use control::{EvalError, Flow, OutputPayload, Signal};
pub use error::{ExceptionKind, SandboxError};
pub use eval::{Interpreter, RunOutcome};
pub use parser::parse;
