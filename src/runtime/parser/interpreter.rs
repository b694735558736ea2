//! Alternative prediction.
//!
//! Full adaptive prediction lives outside this crate; the engine only needs
//! something that turns a decision number plus the current position into an
//! alternative. [`LookaheadInterpreter`] answers from one token of lookahead,
//! which is enough for LL(1) grammars and for the precedence loops of
//! left-recursive rules.

use std::sync::Arc;

use tracing::trace;

use crate::runtime::atn::{Atn, AtnError, Ll1Analyzer, StateId};
use crate::runtime::error::{ParseError, RecognitionError, RecognitionErrorKind};
use crate::runtime::token::TokenStream;
use crate::runtime::tree::{ContextId, ParseTree};

/// The parser's position as seen by a decision.
pub struct DecisionContext<'a> {
    pub atn: &'a Atn,
    pub input: &'a mut dyn TokenStream,
    pub tree: &'a ParseTree,
    pub ctx: Option<ContextId>,
    pub state: i32,
    /// Top of the precedence stack.
    pub precedence: i32,
}

impl DecisionContext<'_> {
    /// Invoking states of the context chain, innermost first.
    pub fn invoking_states(&self) -> Vec<i32> {
        self.ctx
            .map(|ctx| {
                self.tree
                    .parents(ctx)
                    .map(|c| self.tree[c].invoking_state)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Return states of the enclosing invocations, outermost first.
    pub fn follow_stack(&self) -> Result<Vec<StateId>, AtnError> {
        let mut stack = self
            .invoking_states()
            .into_iter()
            .take_while(|&s| s >= 0)
            .map(|s| self.atn.follow_state_of_invocation(s as StateId))
            .collect::<Result<Vec<_>, _>>()?;
        stack.reverse();
        Ok(stack)
    }

    /// The error for "nothing fits here", anchored at the current token.
    pub fn no_viable_alt(&mut self) -> ParseError {
        let current = self.input.lt(1);
        let expected = usize::try_from(self.state)
            .ok()
            .and_then(|s| self.atn.expected_tokens(s, self.invoking_states()).ok());
        ParseError::Recognition(Arc::new(RecognitionError::new(
            RecognitionErrorKind::NoViableAlt {
                start_token: current.clone(),
            },
            current,
            self.state,
            self.ctx,
            expected,
        )))
    }
}

/// Chooses the alternative (1-based) a decision takes.
pub trait DecisionInterpreter {
    fn adaptive_predict(&mut self, decision: usize, request: &mut DecisionContext<'_>) -> Result<usize, ParseError>;

    /// Drop any per-parse state.
    fn reset(&mut self) {}
}

/// One-token lookahead prediction over the automaton.
///
/// Each alternative's lookahead is computed in the full invocation context,
/// with precedence predicates of the current rule evaluated against the top
/// of the precedence stack. The first alternative whose set contains the
/// current token wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookaheadInterpreter;

impl DecisionInterpreter for LookaheadInterpreter {
    fn adaptive_predict(&mut self, decision: usize, request: &mut DecisionContext<'_>) -> Result<usize, ParseError> {
        let atn = request.atn;
        let state = atn
            .decision_state(decision)
            .ok_or(AtnError::ValueOutOfRange {
                what: "decision number",
                value: decision as i64,
            })?;
        let follow_stack = request.follow_stack()?;
        let la = request.input.la(1);
        let analyzer = Ll1Analyzer::new(atn);
        let predicted = state
            .transitions()
            .iter()
            .position(|t| {
                analyzer
                    .alternative_lookahead(t, &follow_stack, request.precedence)
                    .contains(la)
            })
            .map(|i| i + 1);
        trace!(decision, la, alt = ?predicted, "predict");
        predicted.ok_or_else(|| request.no_viable_alt())
    }
}
