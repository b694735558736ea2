//! The automaton container.

use once_cell::sync::OnceCell;
use tracing::warn;

use crate::runtime::misc::{Interval, IntervalSet};
use crate::runtime::token::{EOF, EPSILON};

use super::error::AtnError;
use super::lexer_action::LexerAction;
use super::ll1::Ll1Analyzer;
use super::state::{AtnState, StateId, StateKind};
use super::transition::{Transition, TransitionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarType {
    Lexer = 0,
    Parser = 1,
}

impl GrammarType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(GrammarType::Lexer),
            1 => Some(GrammarType::Parser),
            _ => None,
        }
    }
}

/// A grammar automaton: states, per-rule entry/exit points and the decision list.
///
/// Built once (by the deserializer or [`crate::runtime::testing::AtnBuilder`])
/// and shared read-only afterwards, typically behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Atn {
    pub grammar_type: GrammarType,
    pub max_token_type: i32,
    states: Vec<Option<AtnState>>,
    decision_to_state: Vec<StateId>,
    rule_to_start_state: Vec<StateId>,
    rule_to_stop_state: Vec<StateId>,
    rule_to_token_type: Vec<i32>,
    mode_to_start_state: Vec<StateId>,
    lexer_actions: Vec<LexerAction>,
    next_tokens_cache: OnceCell<Vec<OnceCell<IntervalSet>>>,
}

impl PartialEq for Atn {
    fn eq(&self, other: &Self) -> bool {
        self.grammar_type == other.grammar_type
            && self.max_token_type == other.max_token_type
            && self.states == other.states
            && self.decision_to_state == other.decision_to_state
            && self.rule_to_start_state == other.rule_to_start_state
            && self.rule_to_stop_state == other.rule_to_stop_state
            && self.rule_to_token_type == other.rule_to_token_type
            && self.mode_to_start_state == other.mode_to_start_state
            && self.lexer_actions == other.lexer_actions
    }
}

impl Eq for Atn {}

impl Atn {
    pub fn new(grammar_type: GrammarType, max_token_type: i32) -> Self {
        Atn {
            grammar_type,
            max_token_type,
            states: Vec::new(),
            decision_to_state: Vec::new(),
            rule_to_start_state: Vec::new(),
            rule_to_stop_state: Vec::new(),
            rule_to_token_type: Vec::new(),
            mode_to_start_state: Vec::new(),
            lexer_actions: Vec::new(),
            next_tokens_cache: OnceCell::new(),
        }
    }

    // ==== states ====

    /// Append a state and return its index.
    pub fn add_state(&mut self, rule_index: usize, kind: StateKind) -> StateId {
        self.next_tokens_cache.take();
        let id = self.states.len();
        self.states.push(Some(AtnState::new(id, rule_index, kind)));
        id
    }

    /// Append an empty slot for a state that was optimized away.
    pub fn add_removed_state(&mut self) -> StateId {
        self.next_tokens_cache.take();
        self.states.push(None);
        self.states.len() - 1
    }

    /// Tombstone a state. Indices of other states do not shift.
    pub fn remove_state(&mut self, id: StateId) {
        self.next_tokens_cache.take();
        if let Some(slot) = self.states.get_mut(id) {
            *slot = None;
        }
    }

    pub fn state(&self, id: StateId) -> Option<&AtnState> {
        self.states.get(id).and_then(Option::as_ref)
    }

    pub(crate) fn state_mut(&mut self, id: StateId) -> Option<&mut AtnState> {
        self.next_tokens_cache.take();
        self.states.get_mut(id).and_then(Option::as_mut)
    }

    /// Live state or an [`AtnError::InvalidStateReference`].
    pub fn require_state(&self, id: StateId) -> Result<&AtnState, AtnError> {
        self.state(id).ok_or(AtnError::InvalidStateReference { index: id as i64 })
    }

    pub(crate) fn require_state_mut(&mut self, id: StateId) -> Result<&mut AtnState, AtnError> {
        self.state_mut(id)
            .ok_or(AtnError::InvalidStateReference { index: id as i64 })
    }

    /// All slots, including tombstones.
    pub fn state_slots(&self) -> &[Option<AtnState>] {
        &self.states
    }

    /// Live states in index order.
    pub fn states(&self) -> impl Iterator<Item = &AtnState> {
        self.states.iter().flatten()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn add_transition(&mut self, from: StateId, transition: Transition) -> Result<(), AtnError> {
        let state = self.require_state_mut(from)?;
        if state.add_transition(transition) {
            warn!(
                state = from,
                "automaton state has both epsilon and non-epsilon transitions"
            );
        }
        Ok(())
    }

    // ==== decisions ====

    /// Register a decision state and return its decision number.
    pub fn define_decision_state(&mut self, id: StateId) -> Result<usize, AtnError> {
        let decision = self.decision_to_state.len();
        let state = self.require_state_mut(id)?;
        let info = state
            .kind
            .decision_info_mut()
            .ok_or(AtnError::UnexpectedStateKind {
                state: id,
                expected: "decision state",
            })?;
        info.decision = Some(decision);
        self.decision_to_state.push(id);
        Ok(decision)
    }

    pub fn decision_state(&self, decision: usize) -> Option<&AtnState> {
        self.decision_to_state
            .get(decision)
            .and_then(|&id| self.state(id))
    }

    pub fn decision_states(&self) -> &[StateId] {
        &self.decision_to_state
    }

    pub fn decision_count(&self) -> usize {
        self.decision_to_state.len()
    }

    // ==== rules and modes ====

    pub fn rule_count(&self) -> usize {
        self.rule_to_start_state.len()
    }

    pub fn rule_start_state(&self, rule: usize) -> Option<StateId> {
        self.rule_to_start_state.get(rule).copied()
    }

    pub fn rule_stop_state(&self, rule: usize) -> Option<StateId> {
        self.rule_to_stop_state.get(rule).copied()
    }

    pub fn rule_start_states(&self) -> &[StateId] {
        &self.rule_to_start_state
    }

    pub fn rule_stop_states(&self) -> &[StateId] {
        &self.rule_to_stop_state
    }

    /// Token type a lexer rule produces, or the bypass token of a parser rule.
    pub fn rule_token_type(&self, rule: usize) -> Option<i32> {
        self.rule_to_token_type.get(rule).copied()
    }

    pub fn rule_token_types(&self) -> &[i32] {
        &self.rule_to_token_type
    }

    pub(crate) fn set_rule_start_states(&mut self, starts: Vec<StateId>) {
        self.rule_to_start_state = starts;
    }

    pub(crate) fn set_rule_stop_states(&mut self, stops: Vec<StateId>) {
        self.rule_to_stop_state = stops;
    }

    pub(crate) fn set_rule_token_types(&mut self, token_types: Vec<i32>) {
        self.rule_to_token_type = token_types;
    }

    pub fn is_left_recursive(&self, rule: usize) -> bool {
        self.rule_start_state(rule)
            .and_then(|id| self.state(id))
            .is_some_and(|s| {
                matches!(
                    s.kind,
                    StateKind::RuleStart {
                        is_left_recursive: true,
                        ..
                    }
                )
            })
    }

    pub fn mode_start_states(&self) -> &[StateId] {
        &self.mode_to_start_state
    }

    pub(crate) fn add_mode_start_state(&mut self, id: StateId) {
        self.mode_to_start_state.push(id);
    }

    pub fn lexer_actions(&self) -> &[LexerAction] {
        &self.lexer_actions
    }

    pub(crate) fn set_lexer_actions(&mut self, actions: Vec<LexerAction>) {
        self.lexer_actions = actions;
    }

    // ==== lookahead ====

    /// Tokens that can follow `state` without leaving its rule.
    ///
    /// Contains [`EPSILON`] when the rule's end is reachable. Computed once per
    /// state and frozen.
    pub fn next_tokens(&self, state: StateId) -> Option<&IntervalSet> {
        self.state(state)?;
        let cells = self
            .next_tokens_cache
            .get_or_init(|| self.states.iter().map(|_| OnceCell::new()).collect());
        let cell = cells.get(state)?;
        Some(cell.get_or_init(|| Ll1Analyzer::new(self).look(state, None, None).frozen()))
    }

    /// Tokens that can follow `state` given the return states of the enclosing
    /// invocations (outermost first).
    pub fn next_tokens_in_context(&self, state: StateId, follow_stack: &[StateId]) -> IntervalSet {
        Ll1Analyzer::new(self).look(state, None, Some(follow_stack))
    }

    /// Tokens acceptable at `state`, following rule returns through the
    /// invoking states of the context chain (innermost first).
    ///
    /// Iteration stops at the first negative invoking state (the root). When
    /// the start rule itself can end, [`EOF`] is included.
    pub fn expected_tokens<I>(&self, state: StateId, invoking_states: I) -> Result<IntervalSet, AtnError>
    where
        I: IntoIterator<Item = i32>,
    {
        let mut following = self
            .next_tokens(state)
            .ok_or(AtnError::InvalidStateReference { index: state as i64 })?;
        if !following.contains(EPSILON) {
            return Ok(following.clone());
        }
        let mut expected = IntervalSet::new();
        expected.insert_all(following);
        expected.delete(EPSILON);
        for invoking in invoking_states {
            if invoking < 0 || !following.contains(EPSILON) {
                break;
            }
            let follow = self.follow_state_of_invocation(invoking as StateId)?;
            following = self
                .next_tokens(follow)
                .ok_or(AtnError::InvalidStateReference { index: follow as i64 })?;
            expected.insert_all(following);
            expected.delete(EPSILON);
        }
        if following.contains(EPSILON) {
            expected.insert(Interval::new(EOF, EOF));
        }
        Ok(expected)
    }

    /// Follow state of the rule transition leaving an invoking state.
    pub fn follow_state_of_invocation(&self, invoking: StateId) -> Result<StateId, AtnError> {
        self.require_state(invoking)?
            .transition(0)
            .and_then(Transition::follow_state)
            .ok_or(AtnError::UnexpectedStateKind {
                state: invoking,
                expected: "rule invocation state",
            })
    }

    /// Rule-invocation edges in state order, as `(source, transition ordinal)`.
    pub(crate) fn rule_transitions(&self) -> Vec<(StateId, usize)> {
        self.states()
            .flat_map(|s| {
                s.transitions()
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| matches!(t.kind, TransitionKind::Rule { .. }))
                    .map(move |(i, _)| (s.state_number, i))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_states_keep_indices_stable() {
        let mut atn = Atn::new(GrammarType::Parser, 3);
        let a = atn.add_state(0, StateKind::Basic);
        let gap = atn.add_removed_state();
        let b = atn.add_state(0, StateKind::Basic);
        assert_eq!((a, gap, b), (0, 1, 2));
        assert!(atn.state(gap).is_none());
        atn.remove_state(a);
        assert!(atn.state(a).is_none());
        assert_eq!(atn.state(b).map(|s| s.state_number), Some(2));
        assert_eq!(atn.states().count(), 1);
    }

    #[test]
    fn duplicate_transitions_are_dropped() {
        let mut atn = Atn::new(GrammarType::Parser, 3);
        let a = atn.add_state(0, StateKind::Basic);
        let b = atn.add_state(0, StateKind::Basic);
        atn.add_transition(a, Transition::epsilon(b)).unwrap();
        atn.add_transition(a, Transition::epsilon(b)).unwrap();
        assert_eq!(atn.state(a).unwrap().transition_count(), 1);
        assert!(atn.state(a).unwrap().only_has_epsilon_transitions());
        atn.add_transition(a, Transition::atom(b, 2)).unwrap();
        atn.add_transition(a, Transition::atom(b, 2)).unwrap();
        assert_eq!(atn.state(a).unwrap().transition_count(), 2);
        assert!(!atn.state(a).unwrap().only_has_epsilon_transitions());
    }

    #[test]
    fn define_decision_requires_decision_state() {
        let mut atn = Atn::new(GrammarType::Parser, 3);
        let basic = atn.add_state(0, StateKind::Basic);
        let entry = atn.add_state(
            0,
            StateKind::StarLoopEntry {
                decision: Default::default(),
                loop_back: None,
                precedence_decision: false,
            },
        );
        assert!(atn.define_decision_state(basic).is_err());
        assert_eq!(atn.define_decision_state(entry), Ok(0));
        assert_eq!(atn.decision_state(0).and_then(AtnState::decision), Some(0));
    }
}
