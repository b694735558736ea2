//! Rule contexts and the parse tree
//!
//! Rule contexts are allocated in a [`ParseTree`] arena owned by the parser
//! and addressed by [`ContextId`]. A context is an activation record while its
//! rule runs; when tree building is on it is linked into its parent's children
//! at rule entry and stays there as a tree node.

pub mod arena;
pub mod context;
pub mod listener;
pub mod visitor;

pub use arena::ParseTree;
pub use context::{Child, ContextId, ParserRuleContext, TerminalNode};
pub use listener::{ParseTreeListener, ParseTreeWalker};
pub use visitor::ParseTreeVisitor;
