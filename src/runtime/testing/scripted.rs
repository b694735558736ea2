use std::collections::VecDeque;

use crate::runtime::error::ParseError;
use crate::runtime::parser::{DecisionContext, DecisionInterpreter};

/// Answers decisions from a fixed list of alternatives, in order.
///
/// Once the list runs out every decision fails with a no-viable-alternative
/// error. Each answered decision is logged as `(decision, alternative)`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInterpreter {
    script: VecDeque<usize>,
    answered: Vec<(usize, usize)>,
}

impl ScriptedInterpreter {
    pub fn new(alternatives: impl IntoIterator<Item = usize>) -> Self {
        ScriptedInterpreter {
            script: alternatives.into_iter().collect(),
            answered: Vec::new(),
        }
    }

    pub fn answered(&self) -> &[(usize, usize)] {
        &self.answered
    }
}

impl DecisionInterpreter for ScriptedInterpreter {
    fn adaptive_predict(&mut self, decision: usize, request: &mut DecisionContext<'_>) -> Result<usize, ParseError> {
        let alt = self.script.pop_front().ok_or_else(|| request.no_viable_alt())?;
        self.answered.push((decision, alt));
        Ok(alt)
    }

    fn reset(&mut self) {
        self.answered.clear();
    }
}
