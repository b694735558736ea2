//! # atn-runtime
//!
//! Runtime support for parsers generated from grammars: the grammar
//! automaton and its serialized form, rule contexts and parse trees, the
//! rule-invocation engine generated code calls into, and the error-handling
//! protocol.
//!
//! ## Testing
//!
//! Sample grammars, an automaton builder and callback recorders live in the
//! [testing module](runtime::testing).

pub mod runtime;
