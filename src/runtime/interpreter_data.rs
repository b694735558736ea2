//! Interpreter data: a grammar's names and serialized automaton as the tool
//! writes them next to generated code.
//!
//! The text layout is line based, with an empty line closing each section:
//!
//! ```text
//! token literal names:
//! null
//! '+'
//!
//! token symbolic names:
//! ...
//!
//! rule names:
//! ...
//!
//! channel names:      (lexers only)
//! ...
//!
//! mode names:         (lexers only)
//! ...
//!
//! atn:
//! [4, 1, 2, ...]
//! ```
//!
//! `null` stands for a missing name. The raw, undecoded form also
//! round-trips through JSON.

use std::iter::{Enumerate, Peekable};
use std::str::Lines;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::atn::{Atn, AtnDeserializer, AtnError, DeserializationOptions};
use crate::runtime::parser::GrammarInfo;
use crate::runtime::token::Vocabulary;

static ATN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[(?P<body>[-0-9,\s]*)\]\s*$").expect("valid regex"));

const LITERAL_NAMES: &str = "token literal names:";
const SYMBOLIC_NAMES: &str = "token symbolic names:";
const RULE_NAMES: &str = "rule names:";
const CHANNEL_NAMES: &str = "channel names:";
const MODE_NAMES: &str = "mode names:";
const ATN: &str = "atn:";

#[derive(Debug, Error)]
pub enum InterpreterDataError {
    #[error("line {line}: expected `{expected}`, found `{found}`")]
    UnexpectedEntry {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("interpreter data ended before `{0}`")]
    MissingSection(&'static str),

    #[error("line {line}: automaton data must be a bracketed list of integers")]
    MalformedAtn { line: usize },

    #[error("line {line}: `{value}` is not an integer")]
    InvalidNumber { line: usize, value: String },

    #[error(transparent)]
    Atn(#[from] AtnError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Interpreter data before the automaton is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInterpreterData {
    pub literal_names: Vec<Option<String>>,
    pub symbolic_names: Vec<Option<String>>,
    pub rule_names: Vec<String>,
    /// Lexer grammars only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    /// Lexer grammars only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<Vec<String>>,
    pub atn: Vec<i32>,
}

struct Sections<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
}

impl<'a> Sections<'a> {
    fn new(text: &'a str) -> Self {
        Sections {
            lines: text.lines().enumerate().peekable(),
        }
    }

    fn header(&mut self, expected: &'static str) -> Result<(), InterpreterDataError> {
        match self.lines.next() {
            Some((_, line)) if line.trim_end() == expected => Ok(()),
            Some((i, line)) => Err(InterpreterDataError::UnexpectedEntry {
                line: i + 1,
                expected,
                found: line.to_string(),
            }),
            None => Err(InterpreterDataError::MissingSection(expected)),
        }
    }

    fn at_header(&mut self, expected: &str) -> bool {
        self.lines
            .peek()
            .is_some_and(|(_, line)| line.trim_end() == expected)
    }

    /// Lines up to the next empty line (or the end).
    fn body(&mut self) -> Vec<&'a str> {
        let mut out = Vec::new();
        for (_, line) in self.lines.by_ref() {
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            out.push(line);
        }
        out
    }

    fn names(&mut self) -> Vec<Option<String>> {
        self.body()
            .into_iter()
            .map(|line| (line != "null").then(|| line.to_string()))
            .collect()
    }

    fn atn(&mut self) -> Result<Vec<i32>, InterpreterDataError> {
        let (i, line) = self
            .lines
            .next()
            .ok_or(InterpreterDataError::MissingSection(ATN))?;
        let line_no = i + 1;
        let caps = ATN_LINE
            .captures(line)
            .ok_or(InterpreterDataError::MalformedAtn { line: line_no })?;
        let body = caps["body"].trim();
        if body.is_empty() {
            return Ok(Vec::new());
        }
        body.split(',')
            .map(str::trim)
            .map(|value| {
                value
                    .parse::<i32>()
                    .map_err(|_| InterpreterDataError::InvalidNumber {
                        line: line_no,
                        value: value.to_string(),
                    })
            })
            .collect()
    }
}

fn write_names<'n>(out: &mut String, header: &str, names: impl IntoIterator<Item = Option<&'n str>>) {
    out.push_str(header);
    out.push('\n');
    for name in names {
        out.push_str(name.unwrap_or("null"));
        out.push('\n');
    }
    out.push('\n');
}

impl RawInterpreterData {
    pub fn parse(text: &str) -> Result<Self, InterpreterDataError> {
        let mut sections = Sections::new(text);
        sections.header(LITERAL_NAMES)?;
        let literal_names = sections.names();
        sections.header(SYMBOLIC_NAMES)?;
        let symbolic_names = sections.names();
        sections.header(RULE_NAMES)?;
        let rule_names = sections.body().into_iter().map(str::to_string).collect();

        let (channels, modes) = if sections.at_header(CHANNEL_NAMES) {
            sections.header(CHANNEL_NAMES)?;
            let channels = sections.body().into_iter().map(str::to_string).collect();
            sections.header(MODE_NAMES)?;
            let modes = sections.body().into_iter().map(str::to_string).collect();
            (Some(channels), Some(modes))
        } else {
            (None, None)
        };

        sections.header(ATN)?;
        let atn = sections.atn()?;
        Ok(RawInterpreterData {
            literal_names,
            symbolic_names,
            rule_names,
            channels,
            modes,
            atn,
        })
    }

    /// Render in the text layout [`Self::parse`] reads.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        write_names(&mut out, LITERAL_NAMES, self.literal_names.iter().map(Option::as_deref));
        write_names(&mut out, SYMBOLIC_NAMES, self.symbolic_names.iter().map(Option::as_deref));
        write_names(&mut out, RULE_NAMES, self.rule_names.iter().map(|n| Some(n.as_str())));
        if let (Some(channels), Some(modes)) = (&self.channels, &self.modes) {
            write_names(&mut out, CHANNEL_NAMES, channels.iter().map(|n| Some(n.as_str())));
            write_names(&mut out, MODE_NAMES, modes.iter().map(|n| Some(n.as_str())));
        }
        out.push_str(ATN);
        out.push('\n');
        let values: Vec<String> = self.atn.iter().map(i32::to_string).collect();
        out.push('[');
        out.push_str(&values.join(", "));
        out.push_str("]\n");
        out
    }

    pub fn from_json(json: &str) -> Result<Self, InterpreterDataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, InterpreterDataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::new(self.literal_names.clone(), self.symbolic_names.clone(), Vec::new())
    }

    pub fn decode(self, options: DeserializationOptions) -> Result<InterpreterData, InterpreterDataError> {
        let atn = AtnDeserializer::new(options).deserialize(&self.atn)?;
        Ok(InterpreterData {
            vocabulary: self.vocabulary(),
            rule_names: self.rule_names,
            channels: self.channels,
            modes: self.modes,
            atn,
            serialized_atn: self.atn,
        })
    }
}

/// Decoded interpreter data.
#[derive(Debug, Clone)]
pub struct InterpreterData {
    pub vocabulary: Vocabulary,
    pub rule_names: Vec<String>,
    pub channels: Option<Vec<String>>,
    pub modes: Option<Vec<String>>,
    pub atn: Atn,
    pub serialized_atn: Vec<i32>,
}

impl InterpreterData {
    pub fn parse(text: &str) -> Result<Self, InterpreterDataError> {
        RawInterpreterData::parse(text)?.decode(DeserializationOptions::default())
    }

    /// Grammar description for driving a [`crate::runtime::parser::Parser`].
    pub fn into_grammar_info(self, grammar_file_name: impl Into<String>) -> GrammarInfo {
        GrammarInfo::new(
            grammar_file_name,
            self.rule_names,
            self.vocabulary,
            Arc::new(self.atn),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::atn::serialize;
    use crate::runtime::testing::expr;

    fn expr_raw() -> RawInterpreterData {
        RawInterpreterData {
            literal_names: vec![None, None, Some("'+'".into())],
            symbolic_names: vec![None, Some("INT".into()), Some("PLUS".into())],
            rule_names: vec!["prog".into(), "expr".into()],
            channels: None,
            modes: None,
            atn: serialize(&expr::ATN).unwrap(),
        }
    }

    #[test]
    fn text_layout_parses_back() {
        let raw = expr_raw();
        let text = raw.to_text();
        assert!(text.starts_with("token literal names:\nnull\nnull\n'+'\n\n"));
        assert_eq!(RawInterpreterData::parse(&text).unwrap(), raw);

        let data = InterpreterData::parse(&text).unwrap();
        assert_eq!(data.atn, *expr::ATN);
        assert_eq!(data.vocabulary.max_token_type(), 2);
        assert_eq!(data.vocabulary.display_name(expr::PLUS), "'+'");
        assert!(data.channels.is_none());
    }

    #[test]
    fn lexer_sections_are_optional_but_paired() {
        let text = "token literal names:\nnull\n\ntoken symbolic names:\nnull\n\nrule names:\nA\n\n\
                    channel names:\nDEFAULT_TOKEN_CHANNEL\nHIDDEN\n\nmode names:\nDEFAULT_MODE\n\natn:\n[1, 2]\n";
        let raw = RawInterpreterData::parse(text).unwrap();
        assert_eq!(raw.channels.as_deref(), Some(&["DEFAULT_TOKEN_CHANNEL".to_string(), "HIDDEN".to_string()][..]));
        assert_eq!(raw.modes.as_deref(), Some(&["DEFAULT_MODE".to_string()][..]));
        assert_eq!(raw.atn, vec![1, 2]);

        let broken = text.replace("mode names:", "modes:");
        assert!(matches!(
            RawInterpreterData::parse(&broken),
            Err(InterpreterDataError::UnexpectedEntry {
                expected: MODE_NAMES,
                ..
            })
        ));
    }

    #[test]
    fn bad_headers_and_numbers_are_reported() {
        assert!(matches!(
            RawInterpreterData::parse("rule names:\n"),
            Err(InterpreterDataError::UnexpectedEntry { line: 1, .. })
        ));
        assert!(matches!(
            RawInterpreterData::parse("token literal names:\n\ntoken symbolic names:\n\nrule names:\n\n"),
            Err(InterpreterDataError::MissingSection(ATN))
        ));
        let text = "token literal names:\n\ntoken symbolic names:\n\nrule names:\n\natn:\n[4, x]\n";
        assert!(matches!(
            RawInterpreterData::parse(text),
            Err(InterpreterDataError::MalformedAtn { line: 8 })
        ));
    }

    #[test]
    fn raw_form_survives_json() {
        let raw = expr_raw();
        let json = raw.to_json().unwrap();
        assert!(!json.contains("channels"));
        assert_eq!(RawInterpreterData::from_json(&json).unwrap(), raw);
    }
}
