//! Tokens, vocabularies and the token stream contracts the engine consumes.
//!
//! Concrete character streams and lexer execution are outside the runtime; a
//! recognizer only needs something implementing [`TokenStream`]. Two token
//! sources are provided: [`ListTokenSource`] for pre-lexed tokens and
//! [`LogosTokenSource`] for lexers derived with `logos`.

pub mod logos_source;
pub mod stream;
pub mod vocabulary;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use logos_source::LogosTokenSource;
pub use stream::{CommonTokenStream, ListTokenSource, TokenSource, TokenStream};
pub use vocabulary::Vocabulary;

/// End of input.
pub const EOF: i32 = -1;
/// Pseudo token type marking "rule end reachable" in follow sets.
pub const EPSILON: i32 = -2;
pub const INVALID_TYPE: i32 = 0;
pub const MIN_USER_TOKEN_TYPE: i32 = 1;

pub const DEFAULT_CHANNEL: i32 = 0;
pub const HIDDEN_CHANNEL: i32 = 1;

/// Tokens are shared between the stream buffer, contexts and tree nodes.
pub type TokenRef = Arc<Token>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: i32,
    pub channel: i32,
    pub text: String,
    /// Offset of the first character in the source.
    pub start: i32,
    /// Offset of the last character in the source.
    pub stop: i32,
    /// Position in the token stream; `-1` for tokens that were never part of it.
    pub token_index: i32,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(token_type: i32, text: impl Into<String>) -> Self {
        Token {
            token_type,
            channel: DEFAULT_CHANNEL,
            text: text.into(),
            start: -1,
            stop: -1,
            token_index: -1,
            line: 0,
            column: 0,
        }
    }

    pub fn eof() -> Self {
        Token::new(EOF, "<EOF>")
    }

    pub fn with_channel(mut self, channel: i32) -> Self {
        self.channel = channel;
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn spanning(mut self, start: i32, stop: i32) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    pub fn is_eof(&self) -> bool {
        self.token_type == EOF
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .text
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t");
        let channel = if self.channel > 0 {
            format!(",channel={}", self.channel)
        } else {
            String::new()
        };
        write!(
            f,
            "[@{},{}:{}='{}',<{}>{},{}:{}]",
            self.token_index,
            self.start,
            self.stop,
            text,
            self.token_type,
            channel,
            self.line,
            self.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_escapes_whitespace() {
        let mut token = Token::new(4, "a\tb\n").at(2, 5).spanning(10, 13);
        token.token_index = 3;
        assert_eq!(token.to_string(), "[@3,10:13='a\\tb\\n',<4>,2:5]");
    }

    #[test]
    fn hidden_channel_is_shown() {
        let token = Token::new(2, " ").with_channel(HIDDEN_CHANNEL);
        assert!(token.to_string().contains(",channel=1"));
    }
}
