//! Syntax error listeners.

use tracing::warn;

use crate::runtime::token::Token;

use super::recognition::RecognitionError;

/// Receives every reported syntax error, in registration order.
pub trait ErrorListener {
    fn syntax_error(
        &mut self,
        offending: Option<&Token>,
        line: u32,
        column: u32,
        msg: &str,
        error: Option<&RecognitionError>,
    );
}

/// Default listener: one `warn` event per syntax error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorListener;

impl ErrorListener for TracingErrorListener {
    fn syntax_error(
        &mut self,
        offending: Option<&Token>,
        line: u32,
        column: u32,
        msg: &str,
        _error: Option<&RecognitionError>,
    ) {
        warn!(
            line,
            column,
            token = offending.map(|t| t.token_index),
            "syntax error: {msg}"
        );
    }
}
