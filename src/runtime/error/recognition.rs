//! Recognition errors and the parse-level error type.

use std::sync::Arc;

use thiserror::Error;

use crate::runtime::atn::{AtnError, TransitionKind};
use crate::runtime::misc::IntervalSet;
use crate::runtime::parser::Parser;
use crate::runtime::token::TokenRef;
use crate::runtime::tree::ContextId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// The current token does not match what the grammar requires here.
    InputMismatch,
    /// No alternative of a decision can match the remaining input.
    /// `start_token` is where the decision began looking.
    NoViableAlt { start_token: Option<TokenRef> },
    /// A semantic or precedence predicate evaluated to false.
    FailedPredicate {
        rule_index: usize,
        predicate_index: usize,
        predicate: Option<String>,
    },
}

/// One syntax error, captured when it was detected.
///
/// The expected-token set is computed eagerly: the parser moves on (and the
/// context chain unwinds) before anybody gets to look at the error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RecognitionError {
    pub kind: RecognitionErrorKind,
    pub offending_token: Option<TokenRef>,
    /// Automaton state the parser was in; `-1` when unknown.
    pub offending_state: i32,
    pub ctx: Option<ContextId>,
    pub expected_tokens: Option<IntervalSet>,
    pub message: String,
}

impl RecognitionError {
    pub fn new(
        kind: RecognitionErrorKind,
        offending_token: Option<TokenRef>,
        offending_state: i32,
        ctx: Option<ContextId>,
        expected_tokens: Option<IntervalSet>,
    ) -> Self {
        let message = match &kind {
            RecognitionErrorKind::InputMismatch => "mismatched input".to_string(),
            RecognitionErrorKind::NoViableAlt { .. } => "no viable alternative".to_string(),
            RecognitionErrorKind::FailedPredicate { predicate, .. } => {
                format!("failed predicate: {{{}}}?", predicate.as_deref().unwrap_or_default())
            }
        };
        RecognitionError {
            kind,
            offending_token,
            offending_state,
            ctx,
            expected_tokens,
            message,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// The current token does not fit the parser's current state.
    pub fn input_mismatch(parser: &mut Parser) -> Self {
        Self::new(
            RecognitionErrorKind::InputMismatch,
            Some(parser.current_token()),
            parser.state(),
            parser.context(),
            parser.expected_tokens().ok(),
        )
    }

    /// No alternative fits; the decision started looking at the current token.
    pub fn no_viable_alt(parser: &mut Parser) -> Self {
        let current = parser.current_token();
        Self::new(
            RecognitionErrorKind::NoViableAlt {
                start_token: Some(current.clone()),
            },
            Some(current),
            parser.state(),
            parser.context(),
            parser.expected_tokens().ok(),
        )
    }

    /// A predicate guarding the current state failed. Rule and predicate
    /// index come from the state's first transition when it is a predicate
    /// edge.
    pub fn failed_predicate(parser: &mut Parser, predicate: Option<&str>, message: Option<&str>) -> Self {
        let (rule_index, predicate_index) = usize::try_from(parser.state())
            .ok()
            .and_then(|s| parser.atn().state(s))
            .and_then(|s| s.transition(0))
            .and_then(|t| match t.kind {
                TransitionKind::Predicate {
                    rule_index,
                    pred_index,
                    ..
                } => Some((rule_index, pred_index)),
                _ => None,
            })
            .unwrap_or((0, 0));
        let error = Self::new(
            RecognitionErrorKind::FailedPredicate {
                rule_index,
                predicate_index,
                predicate: predicate.map(str::to_string),
            },
            Some(parser.current_token()),
            parser.state(),
            parser.context(),
            parser.expected_tokens().ok(),
        );
        match message {
            Some(message) => error.with_message(message),
            None => error,
        }
    }

    pub fn start_token(&self) -> Option<&TokenRef> {
        match &self.kind {
            RecognitionErrorKind::NoViableAlt { start_token } => start_token.as_ref(),
            _ => None,
        }
    }
}

/// The unwinding signal of the fail-fast strategy. `cause` is the error that
/// was also stamped on every context of the active chain.
#[derive(Debug, Clone, Error)]
#[error("parse cancelled: {cause}")]
pub struct ParseCancellation {
    #[source]
    pub cause: Arc<RecognitionError>,
}

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// A syntax error on its way to the rule's error handling.
    #[error(transparent)]
    Recognition(Arc<RecognitionError>),

    /// Unwinds every rule invocation up to the caller of the start rule.
    #[error(transparent)]
    Cancelled(#[from] ParseCancellation),

    /// The automaton does not support a query the engine made.
    #[error(transparent)]
    Automaton(#[from] AtnError),
}

impl ParseError {
    pub fn recognition(error: RecognitionError) -> Self {
        ParseError::Recognition(Arc::new(error))
    }

    /// The syntax error behind this failure, if any.
    pub fn cause(&self) -> Option<&Arc<RecognitionError>> {
        match self {
            ParseError::Recognition(e) => Some(e),
            ParseError::Cancelled(c) => Some(&c.cause),
            ParseError::Automaton(_) => None,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, ParseError::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::token::Token;

    #[test]
    fn predicate_message_names_the_predicate() {
        let error = RecognitionError::new(
            RecognitionErrorKind::FailedPredicate {
                rule_index: 1,
                predicate_index: 0,
                predicate: Some("precpred(_ctx, 2)".into()),
            },
            None,
            11,
            None,
            None,
        );
        assert_eq!(error.to_string(), "failed predicate: {precpred(_ctx, 2)}?");
    }

    #[test]
    fn cancellation_keeps_its_cause() {
        let cause = Arc::new(RecognitionError::new(
            RecognitionErrorKind::InputMismatch,
            Some(Arc::new(Token::new(3, "x"))),
            4,
            None,
            None,
        ));
        let error = ParseError::from(ParseCancellation { cause: cause.clone() });
        assert!(error.is_cancellation());
        assert!(Arc::ptr_eq(error.cause().unwrap(), &cause));
        assert_eq!(error.to_string(), "parse cancelled: mismatched input");
    }
}
