//! The rule-invocation engine
//!
//! Generated rule functions drive a [`Parser`]: they enter and exit rules,
//! match tokens, ask the [`DecisionInterpreter`] which alternative to take and
//! hand syntax errors to the [`crate::runtime::error::ErrorStrategy`]. The
//! engine keeps the context chain, the precedence stack for left-recursive
//! rules and (optionally) the parse tree.

pub mod engine;
pub mod grammar;
pub mod interpreter;
pub mod options;

pub use engine::Parser;
pub use grammar::GrammarInfo;
pub use interpreter::{DecisionContext, DecisionInterpreter, LookaheadInterpreter};
pub use options::ParserOptions;
