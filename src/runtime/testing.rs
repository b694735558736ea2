//! Testing utilities
//!
//! Hand-built automata and small generated-style parsers, shared by unit
//! tests, integration tests and downstream crates that want to exercise the
//! engine without a grammar tool.
//!
//! - [`AtnBuilder`] assembles an automaton state by state and runs the same
//!   linking passes as the deserializer, so a built automaton compares equal
//!   to `decode(encode(built))`.
//! - [`expr`] is a two-rule grammar with a left-recursive rule, as automaton
//!   plus rule functions written the way a code generator emits them.
//! - [`list`] covers optional blocks, loops, set matches and rules with
//!   labelled alternatives.
//! - [`ScriptedInterpreter`] answers decisions from a fixed list.
//! - [`RepairingStrategy`] conjures missing tokens and drops stray ones, so
//!   error nodes show up in trees.
//! - [`EventRecorder`] and [`CollectingErrorListener`] capture callbacks as
//!   strings for assertions.

pub mod builder;
pub mod expr;
pub mod list;
pub mod recorders;
pub mod repairing;
pub mod scripted;

pub use builder::AtnBuilder;
pub use recorders::{CollectingErrorListener, EventRecorder};
pub use repairing::RepairingStrategy;
pub use scripted::ScriptedInterpreter;
