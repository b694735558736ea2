//! Adapter turning a `logos` lexer into a [`TokenSource`].

use logos::Logos;

use super::stream::TokenSource;
use super::{Token, INVALID_TYPE};

/// Drives a `logos` lexer and maps each lexeme to a token type.
///
/// `classify` returns `None` for lexemes that should be dropped (comments,
/// whitespace not already skipped by the lexer). Lexing errors surface as
/// tokens of type [`INVALID_TYPE`] so the parser reports them as mismatches.
pub struct LogosTokenSource<'s, T, F>
where
    T: Logos<'s, Source = str>,
    F: FnMut(&T) -> Option<i32>,
{
    lexer: logos::Lexer<'s, T>,
    classify: F,
    name: String,
    line: u32,
    line_start: usize,
    scanned: usize,
}

impl<'s, T, F> LogosTokenSource<'s, T, F>
where
    T: Logos<'s, Source = str>,
    T::Extras: Default,
    F: FnMut(&T) -> Option<i32>,
{
    pub fn new(source: &'s str, classify: F) -> Self {
        LogosTokenSource {
            lexer: T::lexer(source),
            classify,
            name: "<string>".to_string(),
            line: 1,
            line_start: 0,
            scanned: 0,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<'s, T, F> LogosTokenSource<'s, T, F>
where
    T: Logos<'s, Source = str>,
    F: FnMut(&T) -> Option<i32>,
{
    /// Move the line counter up to byte offset `pos`.
    fn advance_to(&mut self, pos: usize) {
        let source = self.lexer.source();
        if pos <= self.scanned {
            return;
        }
        for (offset, c) in source[self.scanned..pos].char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.scanned + offset + 1;
            }
        }
        self.scanned = pos;
    }

    fn make_token(&mut self, token_type: i32) -> Token {
        let span = self.lexer.span();
        self.advance_to(span.start);
        let source = self.lexer.source();
        let column = source[self.line_start..span.start].chars().count() as u32;
        Token::new(token_type, self.lexer.slice())
            .spanning(span.start as i32, span.end as i32 - 1)
            .at(self.line, column)
    }
}

impl<'s, T, F> TokenSource for LogosTokenSource<'s, T, F>
where
    T: Logos<'s, Source = str>,
    F: FnMut(&T) -> Option<i32>,
{
    fn next_token(&mut self) -> Token {
        loop {
            match self.lexer.next() {
                Some(Ok(kind)) => {
                    if let Some(token_type) = (self.classify)(&kind) {
                        return self.make_token(token_type);
                    }
                }
                Some(Err(_)) => return self.make_token(INVALID_TYPE),
                None => {
                    let end = self.lexer.source().len();
                    self.advance_to(end);
                    let column = self.lexer.source()[self.line_start..].chars().count() as u32;
                    return Token::eof()
                        .spanning(end as i32, end as i32 - 1)
                        .at(self.line, column);
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::token::{CommonTokenStream, TokenStream, EOF};

    #[derive(Logos, Debug, Clone, Copy, PartialEq)]
    #[logos(skip r"[ \t\r\n]+")]
    enum Lexeme {
        #[regex("[0-9]+")]
        Int,
        #[token("+")]
        Plus,
        #[regex("#[^\n]*")]
        Comment,
    }

    fn classify(lexeme: &Lexeme) -> Option<i32> {
        match lexeme {
            Lexeme::Int => Some(2),
            Lexeme::Plus => Some(1),
            Lexeme::Comment => None,
        }
    }

    #[test]
    fn tracks_lines_and_columns() {
        let mut source = LogosTokenSource::new("1 +\n  22 # note\n", classify);
        let one = source.next_token();
        assert_eq!((one.token_type, one.line, one.column), (2, 1, 0));
        let plus = source.next_token();
        assert_eq!((plus.token_type, plus.line, plus.column), (1, 1, 2));
        let two = source.next_token();
        assert_eq!((two.text.as_str(), two.line, two.column), ("22", 2, 2));
        assert_eq!((two.start, two.stop), (6, 7));
        assert_eq!(source.next_token().token_type, EOF);
    }

    #[test]
    fn unknown_input_becomes_invalid_token() {
        let mut stream = CommonTokenStream::new(LogosTokenSource::new("1 ? 2", classify));
        assert_eq!(stream.la(1), 2);
        assert_eq!(stream.la(2), INVALID_TYPE);
        assert_eq!(stream.la(3), 2);
        assert_eq!(stream.la(4), EOF);
    }
}
