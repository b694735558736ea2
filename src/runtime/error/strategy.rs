//! Error strategies: what the engine does when the input stops matching.

use std::cell::Cell;
use std::sync::Arc;

use crate::runtime::parser::Parser;
use crate::runtime::token::{Token, TokenRef};
use crate::runtime::tree::arena::escape_whitespace;

use super::recognition::{ParseCancellation, ParseError, RecognitionError, RecognitionErrorKind};

/// The hooks generated rule functions and the engine call on syntax errors.
///
/// A strategy is shared by the parser (`Rc`) and takes the parser as an
/// explicit argument, so any per-parse state it keeps lives in cells.
pub trait ErrorStrategy {
    /// Forget any error state; called when the parser is reset.
    fn reset(&self, parser: &mut Parser);

    /// The current token does not match. Return the token to use in its
    /// place, or fail.
    fn recover_inline(&self, parser: &mut Parser) -> Result<TokenRef, ParseError>;

    /// Called from a rule's error handling after the error was reported.
    fn recover(&self, parser: &mut Parser, error: Arc<RecognitionError>) -> Result<(), ParseError>;

    /// Called before loop and sub-rule decisions.
    fn sync(&self, parser: &mut Parser) -> Result<(), ParseError>;

    fn in_error_recovery_mode(&self, parser: &Parser) -> bool;

    /// A token matched successfully.
    fn report_match(&self, parser: &mut Parser);

    fn report_error(&self, parser: &mut Parser, error: &RecognitionError);
}

/// Fail-fast strategy: the first syntax error cancels the parse.
///
/// The error is stamped on the current context and every ancestor, then the
/// parse unwinds with [`ParseError::Cancelled`]. Nothing is consumed or
/// conjured, and no error nodes are produced.
#[derive(Debug, Default)]
pub struct BailErrorStrategy {
    error_recovery_mode: Cell<bool>,
}

impl BailErrorStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_error_condition(&self) {
        self.error_recovery_mode.set(true);
    }

    fn end_error_condition(&self) {
        self.error_recovery_mode.set(false);
    }

    fn cancel(&self, parser: &mut Parser, error: Arc<RecognitionError>) -> ParseError {
        if let Some(ctx) = parser.context() {
            let chain: Vec<_> = parser.tree().parents(ctx).collect();
            for id in chain {
                parser.tree_mut()[id].exception = Some(Arc::clone(&error));
            }
        }
        ParseError::Cancelled(ParseCancellation { cause: error })
    }

    fn no_viable_alternative_message(parser: &mut Parser, error: &RecognitionError) -> String {
        let input = match (error.start_token(), &error.offending_token) {
            (Some(start), _) if start.is_eof() => "<EOF>".to_string(),
            (Some(start), Some(offending)) => {
                match (usize::try_from(start.token_index), usize::try_from(offending.token_index)) {
                    (Ok(a), Ok(b)) => parser.input_mut().text_between(a, b),
                    _ => offending.text.clone(),
                }
            }
            _ => "<unknown input>".to_string(),
        };
        format!("no viable alternative at input {}", quote(&input))
    }

    fn input_mismatch_message(parser: &Parser, error: &RecognitionError) -> String {
        let expecting = error
            .expected_tokens
            .as_ref()
            .map_or_else(|| "{}".to_string(), |set| set.to_string_with(parser.vocabulary()));
        format!(
            "mismatched input {} expecting {expecting}",
            token_error_display(error.offending_token.as_deref())
        )
    }

    fn failed_predicate_message(parser: &Parser, error: &RecognitionError) -> String {
        let rule = parser
            .context()
            .and_then(|ctx| parser.rule_names().get(parser.tree()[ctx].rule_index))
            .map_or("<unknown>", String::as_str);
        format!("rule {rule} {}", error.message)
    }
}

impl ErrorStrategy for BailErrorStrategy {
    fn reset(&self, _parser: &mut Parser) {
        self.end_error_condition();
    }

    fn recover_inline(&self, parser: &mut Parser) -> Result<TokenRef, ParseError> {
        let error = Arc::new(RecognitionError::input_mismatch(parser));
        Err(self.cancel(parser, error))
    }

    fn recover(&self, parser: &mut Parser, error: Arc<RecognitionError>) -> Result<(), ParseError> {
        Err(self.cancel(parser, error))
    }

    fn sync(&self, _parser: &mut Parser) -> Result<(), ParseError> {
        Ok(())
    }

    fn in_error_recovery_mode(&self, _parser: &Parser) -> bool {
        self.error_recovery_mode.get()
    }

    fn report_match(&self, _parser: &mut Parser) {
        self.end_error_condition();
    }

    fn report_error(&self, parser: &mut Parser, error: &RecognitionError) {
        if self.error_recovery_mode.get() {
            return;
        }
        self.begin_error_condition();
        let msg = match &error.kind {
            RecognitionErrorKind::NoViableAlt { .. } => Self::no_viable_alternative_message(parser, error),
            RecognitionErrorKind::InputMismatch => Self::input_mismatch_message(parser, error),
            RecognitionErrorKind::FailedPredicate { .. } => Self::failed_predicate_message(parser, error),
        };
        parser.notify_error_listeners(error.offending_token.as_deref(), &msg, Some(error));
    }
}

/// Quoted, whitespace-escaped token text for error messages.
pub fn token_error_display(token: Option<&Token>) -> String {
    match token {
        None => "<no token>".to_string(),
        Some(t) if t.is_eof() => "<EOF>".to_string(),
        Some(t) => quote(&t.text),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", escape_whitespace(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_display_escapes_and_names_eof() {
        assert_eq!(token_error_display(Some(&Token::new(3, "a\tb"))), "'a\\tb'");
        assert_eq!(token_error_display(Some(&Token::eof())), "<EOF>");
        assert_eq!(token_error_display(None), "<no token>");
    }
}
