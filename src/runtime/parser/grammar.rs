//! Static, shareable description of one generated parser.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::runtime::atn::{generate_rule_bypass_transitions, Atn, AtnDeserializer, AtnError, DeserializationOptions};
use crate::runtime::token::Vocabulary;

/// Everything a parser instance needs to know about its grammar.
///
/// One value is typically shared (`Arc`) by every parser instance of a
/// grammar. The bypass-alternative variant of the automaton is derived lazily
/// and cached here.
#[derive(Debug)]
pub struct GrammarInfo {
    pub grammar_file_name: String,
    pub rule_names: Vec<String>,
    pub vocabulary: Vocabulary,
    pub atn: Arc<Atn>,
    serialized_atn: Option<Vec<i32>>,
    bypass_atn: OnceCell<Arc<Atn>>,
}

impl GrammarInfo {
    pub fn new(
        grammar_file_name: impl Into<String>,
        rule_names: Vec<String>,
        vocabulary: Vocabulary,
        atn: Arc<Atn>,
    ) -> Self {
        GrammarInfo {
            grammar_file_name: grammar_file_name.into(),
            rule_names,
            vocabulary,
            atn,
            serialized_atn: None,
            bypass_atn: OnceCell::new(),
        }
    }

    /// Decode the automaton from its serialized form and keep the data, so
    /// the bypass variant can be decoded from the same source.
    pub fn from_serialized(
        grammar_file_name: impl Into<String>,
        rule_names: Vec<String>,
        vocabulary: Vocabulary,
        serialized_atn: Vec<i32>,
        options: DeserializationOptions,
    ) -> Result<Self, AtnError> {
        let atn = AtnDeserializer::new(options).deserialize(&serialized_atn)?;
        let mut info = Self::new(grammar_file_name, rule_names, vocabulary, Arc::new(atn));
        info.serialized_atn = Some(serialized_atn);
        Ok(info)
    }

    pub fn serialized_atn(&self) -> Option<&[i32]> {
        self.serialized_atn.as_deref()
    }

    pub fn rule_index(&self, name: &str) -> Option<usize> {
        self.rule_names.iter().position(|r| r == name)
    }

    /// The automaton with a bypass alternative added to every rule, built on
    /// first use.
    pub fn atn_with_bypass_alts(&self) -> Result<Arc<Atn>, AtnError> {
        self.bypass_atn
            .get_or_try_init(|| {
                let atn = match &self.serialized_atn {
                    Some(data) => AtnDeserializer::new(DeserializationOptions {
                        verify_atn: true,
                        generate_rule_bypass_transitions: true,
                    })
                    .deserialize(data)?,
                    None => {
                        let mut atn = Atn::clone(&self.atn);
                        generate_rule_bypass_transitions(&mut atn)?;
                        atn
                    }
                };
                Ok(Arc::new(atn))
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::atn::serialize;
    use crate::runtime::testing::expr;

    #[test]
    fn bypass_automaton_is_cached_and_identical_for_both_sources() {
        let direct = expr::grammar();
        let decoded = GrammarInfo::from_serialized(
            "Expr.g4",
            direct.rule_names.clone(),
            direct.vocabulary.clone(),
            serialize(&direct.atn).unwrap(),
            DeserializationOptions::default(),
        )
        .unwrap();

        let first = direct.atn_with_bypass_alts().unwrap();
        let again = direct.atn_with_bypass_alts().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *decoded.atn_with_bypass_alts().unwrap());
        assert_eq!(first.rule_count(), direct.atn.rule_count());
        assert_eq!(direct.rule_index("expr"), Some(expr::RULE_EXPR));
    }
}
