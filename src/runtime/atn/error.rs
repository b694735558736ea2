//! Errors raised while building, decoding, encoding or verifying an automaton.
//!
//! All of these are fatal for the automaton in question: they indicate corrupt
//! or incompatible serialized data, or a graph that breaks a structural
//! invariant. None of them go through the syntax error listeners.

use thiserror::Error;

use crate::runtime::misc::IntervalSetError;

use super::state::StateId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtnError {
    #[error("could not deserialize automaton with version {found} (expected {expected})")]
    UnsupportedVersion { found: i32, expected: i32 },

    #[error("serialized automaton ended unexpectedly at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("unknown grammar type {0}")]
    InvalidGrammarType(i32),

    #[error("unknown state type {0}")]
    InvalidStateType(i32),

    #[error("the specified transition type {0} is not valid")]
    InvalidTransitionType(i32),

    #[error("the specified lexer action type {0} is not valid")]
    InvalidLexerActionType(i32),

    #[error("state reference {index} does not name a live state")]
    InvalidStateReference { index: i64 },

    #[error("state {state} is not a {expected}")]
    UnexpectedStateKind { state: StateId, expected: &'static str },

    #[error("set reference {index} is out of range")]
    InvalidSetReference { index: i64 },

    #[error("value {value} is out of range for {what}")]
    ValueOutOfRange { what: &'static str, value: i64 },

    #[error("rule {rule} has no stop state")]
    MissingRuleStop { rule: usize },

    #[error("state {state}: {condition}")]
    Invariant { state: StateId, condition: &'static str },

    #[error("cannot serialize a transition to removed state {target}")]
    RemovedStateTarget { target: StateId },

    #[error("serialized automaton element {index} = {value} doesn't fit in 31 bits")]
    WordOverflow { index: usize, value: i32 },

    #[error("truncated 16-bit word data at offset {offset}")]
    TruncatedWords { offset: usize },

    #[error("couldn't identify final state of the precedence rule prefix section of rule {rule}")]
    MissingPrecedencePrefix { rule: usize },

    #[error(transparent)]
    IntervalSet(#[from] IntervalSetError),
}
