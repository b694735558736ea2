//! Token-type naming.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::EOF;

pub static EMPTY_VOCABULARY: Lazy<Vocabulary> = Lazy::new(Vocabulary::default);

/// Maps token types to literal (`'+'`), symbolic (`PLUS`) and display names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    literal_names: Vec<Option<String>>,
    symbolic_names: Vec<Option<String>>,
    display_names: Vec<Option<String>>,
}

fn owned(names: &[Option<&str>]) -> Vec<Option<String>> {
    names.iter().map(|n| n.map(str::to_string)).collect()
}

impl Vocabulary {
    pub fn new(
        literal_names: Vec<Option<String>>,
        symbolic_names: Vec<Option<String>>,
        display_names: Vec<Option<String>>,
    ) -> Self {
        Vocabulary {
            literal_names,
            symbolic_names,
            display_names,
        }
    }

    /// Build from the static name tables a generated recognizer carries.
    pub fn from_static(literal_names: &[Option<&str>], symbolic_names: &[Option<&str>]) -> Self {
        Vocabulary::new(owned(literal_names), owned(symbolic_names), Vec::new())
    }

    /// Split legacy token names into literal and symbolic names.
    ///
    /// A name starting with `'` is a literal, one starting with an uppercase
    /// letter is symbolic; anything else only survives as a display name.
    pub fn from_token_names(token_names: &[Option<&str>]) -> Self {
        let mut literal_names = owned(token_names);
        let mut symbolic_names = owned(token_names);
        for (i, name) in token_names.iter().enumerate() {
            let Some(name) = name else {
                continue;
            };
            match name.chars().next() {
                Some('\'') => symbolic_names[i] = None,
                Some(c) if c.is_uppercase() => literal_names[i] = None,
                _ => {
                    literal_names[i] = None;
                    symbolic_names[i] = None;
                }
            }
        }
        Vocabulary::new(literal_names, symbolic_names, owned(token_names))
    }

    pub fn max_token_type(&self) -> i32 {
        let longest = self
            .display_names
            .len()
            .max(self.literal_names.len())
            .max(self.symbolic_names.len());
        longest as i32 - 1
    }

    fn lookup(names: &[Option<String>], token_type: i32) -> Option<&str> {
        usize::try_from(token_type)
            .ok()
            .and_then(|i| names.get(i))
            .and_then(|n| n.as_deref())
    }

    pub fn literal_name(&self, token_type: i32) -> Option<&str> {
        Self::lookup(&self.literal_names, token_type)
    }

    pub fn symbolic_name(&self, token_type: i32) -> Option<&str> {
        if token_type == EOF {
            return Some("EOF");
        }
        Self::lookup(&self.symbolic_names, token_type)
    }

    /// Display name, falling back to the literal, then symbolic name, then the number.
    pub fn display_name(&self, token_type: i32) -> String {
        Self::lookup(&self.display_names, token_type)
            .or_else(|| self.literal_name(token_type))
            .or_else(|| self.symbolic_name(token_type))
            .map(str::to_string)
            .unwrap_or_else(|| token_type.to_string())
    }
}
