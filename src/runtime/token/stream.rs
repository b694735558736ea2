//! Token sources and the buffered, channel-filtering token stream.

use std::sync::Arc;

use super::{Token, TokenRef, DEFAULT_CHANNEL, EOF};

/// Produces tokens one at a time, ending with an EOF token that repeats forever.
pub trait TokenSource {
    fn next_token(&mut self) -> Token;

    fn source_name(&self) -> &str {
        "<unknown>"
    }
}

/// Lookahead-by-offset view of a token sequence.
///
/// Offsets are 1-based: `lt(1)` is the current token, `lt(-1)` the previous
/// on-channel token. `lt(0)` is undefined and yields `None`.
pub trait TokenStream {
    fn lt(&mut self, k: isize) -> Option<TokenRef>;

    /// Token type at offset `k`, or [`super::INVALID_TYPE`] when there is none.
    fn la(&mut self, k: isize) -> i32 {
        self.lt(k).map_or(super::INVALID_TYPE, |t| t.token_type)
    }

    fn consume(&mut self);

    fn index(&self) -> usize;

    fn seek(&mut self, index: usize);

    /// Number of tokens buffered so far.
    fn size(&self) -> usize;

    fn get(&self, index: usize) -> Option<TokenRef>;

    /// Concatenated text of tokens `start..=stop` by token index.
    fn text_between(&mut self, start: usize, stop: usize) -> String;

    fn source_name(&self) -> String;

    fn is_at_eof(&mut self) -> bool {
        self.la(1) == EOF
    }
}

/// Replays a fixed token list, synthesizing EOF after the last one.
#[derive(Debug, Clone)]
pub struct ListTokenSource {
    tokens: Vec<Token>,
    next: usize,
    name: String,
}

impl ListTokenSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        ListTokenSource {
            tokens,
            next: 0,
            name: "<list>".to_string(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn synthesized_eof(&self) -> Token {
        let mut eof = Token::eof();
        if let Some(last) = self.tokens.last() {
            let start = last.stop + 1;
            eof.start = start;
            eof.stop = start - 1;
            eof.line = last.line;
            eof.column = last.column + last.text.chars().count() as u32;
        } else {
            eof.line = 1;
        }
        eof
    }
}

impl TokenSource for ListTokenSource {
    fn next_token(&mut self) -> Token {
        match self.tokens.get(self.next) {
            Some(token) if token.token_type != EOF => {
                self.next += 1;
                token.clone()
            }
            Some(token) => token.clone(),
            None => self.synthesized_eof(),
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Buffers every token of a source and presents only one channel to lookahead.
///
/// Tokens receive their `token_index` as they are buffered.
pub struct CommonTokenStream<S: TokenSource> {
    source: S,
    tokens: Vec<TokenRef>,
    p: Option<usize>,
    fetched_eof: bool,
    channel: i32,
}

impl<S: TokenSource> CommonTokenStream<S> {
    pub fn new(source: S) -> Self {
        Self::on_channel(source, DEFAULT_CHANNEL)
    }

    pub fn on_channel(source: S, channel: i32) -> Self {
        CommonTokenStream {
            source,
            tokens: Vec::new(),
            p: None,
            fetched_eof: false,
            channel,
        }
    }

    /// Buffer the whole source.
    pub fn fill(&mut self) {
        while !self.fetched_eof {
            self.fetch(1000);
        }
    }

    pub fn tokens(&self) -> &[TokenRef] {
        &self.tokens
    }

    /// Make sure `tokens[i]` exists; false when the source ran out first.
    fn sync(&mut self, i: usize) -> bool {
        if i >= self.tokens.len() {
            let needed = i + 1 - self.tokens.len();
            self.fetch(needed) >= needed
        } else {
            true
        }
    }

    fn fetch(&mut self, n: usize) -> usize {
        if self.fetched_eof {
            return 0;
        }
        for fetched in 0..n {
            let mut token = self.source.next_token();
            token.token_index = self.tokens.len() as i32;
            let is_eof = token.token_type == EOF;
            self.tokens.push(Arc::new(token));
            if is_eof {
                self.fetched_eof = true;
                return fetched + 1;
            }
        }
        n
    }

    fn next_on_channel(&mut self, mut i: usize) -> usize {
        self.sync(i);
        if i >= self.tokens.len() {
            return self.tokens.len().saturating_sub(1);
        }
        loop {
            let token = &self.tokens[i];
            if token.channel == self.channel || token.token_type == EOF {
                return i;
            }
            i += 1;
            self.sync(i);
            if i >= self.tokens.len() {
                return self.tokens.len() - 1;
            }
        }
    }

    fn previous_on_channel(&self, i: usize) -> Option<usize> {
        let mut i = i.min(self.tokens.len().checked_sub(1)?);
        loop {
            let token = &self.tokens[i];
            if token.channel == self.channel || token.token_type == EOF {
                return Some(i);
            }
            i = i.checked_sub(1)?;
        }
    }

    fn position(&mut self) -> usize {
        match self.p {
            Some(p) => p,
            None => {
                let p = self.next_on_channel(0);
                self.p = Some(p);
                p
            }
        }
    }

    fn lb(&mut self, k: usize) -> Option<TokenRef> {
        let p = self.position();
        if k == 0 || k > p {
            return None;
        }
        let mut i = p;
        for _ in 0..k {
            i = self.previous_on_channel(i.checked_sub(1)?)?;
        }
        self.tokens.get(i).cloned()
    }
}

impl<S: TokenSource> TokenStream for CommonTokenStream<S> {
    fn lt(&mut self, k: isize) -> Option<TokenRef> {
        if k == 0 {
            return None;
        }
        if k < 0 {
            return self.lb(k.unsigned_abs());
        }
        let mut i = self.position();
        for _ in 1..k {
            if self.sync(i + 1) {
                i = self.next_on_channel(i + 1);
            }
        }
        self.tokens.get(i).or_else(|| self.tokens.last()).cloned()
    }

    fn consume(&mut self) {
        let p = self.position();
        if self.tokens.get(p).is_some_and(|t| t.token_type == EOF) {
            return;
        }
        if self.sync(p + 1) {
            self.p = Some(self.next_on_channel(p + 1));
        }
    }

    fn index(&self) -> usize {
        self.p.unwrap_or(0)
    }

    fn seek(&mut self, index: usize) {
        self.p = None;
        let target = self.next_on_channel(index);
        self.p = Some(target);
    }

    fn size(&self) -> usize {
        self.tokens.len()
    }

    fn get(&self, index: usize) -> Option<TokenRef> {
        self.tokens.get(index).cloned()
    }

    fn text_between(&mut self, start: usize, stop: usize) -> String {
        self.sync(stop);
        self.tokens
            .iter()
            .skip(start)
            .take((stop + 1).saturating_sub(start))
            .take_while(|t| t.token_type != EOF)
            .map(|t| t.text.as_str())
            .collect()
    }

    fn source_name(&self) -> String {
        self.source.source_name().to_string()
    }
}
