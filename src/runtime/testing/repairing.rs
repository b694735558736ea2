use std::cell::Cell;
use std::sync::Arc;

use crate::runtime::error::strategy::token_error_display;
use crate::runtime::error::{ErrorStrategy, ParseCancellation, ParseError, RecognitionError};
use crate::runtime::parser::Parser;
use crate::runtime::token::{Token, TokenRef, EPSILON};

/// A minimal repairing strategy for exercising the engine's error-node paths.
///
/// `sync` drops one stray token, which lands in the tree as an error node.
/// `recover_inline` conjures the missing token instead of failing. Any error
/// that reaches `recover` still ends the parse. Recovery mode can also be
/// switched on by hand with [`RepairingStrategy::set_recovering`].
#[derive(Debug, Default)]
pub struct RepairingStrategy {
    recovering: Cell<bool>,
}

impl RepairingStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_recovering(&self, recovering: bool) {
        self.recovering.set(recovering);
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering.get()
    }

    fn report(&self, parser: &mut Parser, offending: &Token, msg: &str) {
        if self.recovering.get() {
            return;
        }
        self.recovering.set(true);
        parser.notify_error_listeners(Some(offending), msg, None);
    }
}

impl ErrorStrategy for RepairingStrategy {
    fn reset(&self, _parser: &mut Parser) {
        self.recovering.set(false);
    }

    fn recover_inline(&self, parser: &mut Parser) -> Result<TokenRef, ParseError> {
        let expected = parser.expected_tokens()?;
        let current = parser.current_token();
        let Some(ttype) = expected.min_element() else {
            let error = Arc::new(RecognitionError::input_mismatch(parser));
            return Err(ParseError::Cancelled(ParseCancellation { cause: error }));
        };
        let name = parser.vocabulary().display_name(ttype);
        let msg = format!("missing {name} at {}", token_error_display(Some(&*current)));
        self.report(parser, &current, &msg);
        let conjured = Token::new(ttype, format!("<missing {name}>")).at(current.line, current.column);
        Ok(Arc::new(conjured))
    }

    fn recover(&self, _parser: &mut Parser, error: Arc<RecognitionError>) -> Result<(), ParseError> {
        Err(ParseError::Cancelled(ParseCancellation { cause: error }))
    }

    fn sync(&self, parser: &mut Parser) -> Result<(), ParseError> {
        let expecting = parser.expected_tokens_within_current_rule()?;
        let current = parser.current_token();
        if expecting.contains(current.token_type) || expecting.contains(EPSILON) || current.is_eof() {
            return Ok(());
        }
        let msg = format!(
            "extraneous input {} expecting {}",
            token_error_display(Some(&*current)),
            expecting.to_string_with(parser.vocabulary())
        );
        self.report(parser, &current, &msg);
        parser.consume();
        Ok(())
    }

    fn in_error_recovery_mode(&self, _parser: &Parser) -> bool {
        self.recovering.get()
    }

    fn report_match(&self, _parser: &mut Parser) {
        self.recovering.set(false);
    }

    fn report_error(&self, parser: &mut Parser, error: &RecognitionError) {
        if self.recovering.get() {
            return;
        }
        self.recovering.set(true);
        parser.notify_error_listeners(error.offending_token.as_deref(), &error.message, Some(error));
    }
}
