use crate::runtime::atn::deserializer::{
    derive_rule_stop_edges, link_blocks_and_loops, link_rule_stop_states, mark_precedence_decisions,
};
use crate::runtime::atn::{
    verify, Atn, AtnError, GrammarType, LexerAction, StateId, StateKind, StateType, Transition,
};

/// Incremental automaton construction.
///
/// States are numbered in creation order. Block ends, loop-end back links,
/// rule starts and decisions are declared explicitly, the way serialized data
/// declares them; everything derivable (rule stop links and return edges,
/// block start back links, loop entries, precedence decisions) is filled in
/// by [`AtnBuilder::build`].
#[derive(Debug)]
pub struct AtnBuilder {
    atn: Atn,
    rule_starts: Vec<Option<StateId>>,
    rule_token_types: Vec<i32>,
    pending: Result<(), AtnError>,
}

impl AtnBuilder {
    pub fn new(grammar_type: GrammarType, max_token_type: i32) -> Self {
        AtnBuilder {
            atn: Atn::new(grammar_type, max_token_type),
            rule_starts: Vec::new(),
            rule_token_types: Vec::new(),
            pending: Ok(()),
        }
    }

    pub fn parser(max_token_type: i32) -> Self {
        Self::new(GrammarType::Parser, max_token_type)
    }

    fn record(&mut self, result: Result<(), AtnError>) {
        if self.pending.is_ok() {
            self.pending = result;
        }
    }

    /// Add an unlinked state of `state_type`.
    pub fn state(&mut self, rule: usize, state_type: StateType) -> StateId {
        match StateKind::placeholder(state_type) {
            Some(kind) => self.atn.add_state(rule, kind),
            None => self.atn.add_removed_state(),
        }
    }

    pub fn basic(&mut self, rule: usize) -> StateId {
        self.state(rule, StateType::Basic)
    }

    /// The start state of `rule`.
    pub fn rule_start(&mut self, rule: usize, left_recursive: bool) -> StateId {
        let id = self.atn.add_state(
            rule,
            StateKind::RuleStart {
                stop_state: None,
                is_left_recursive: left_recursive,
            },
        );
        if self.rule_starts.len() <= rule {
            self.rule_starts.resize(rule + 1, None);
        }
        self.rule_starts[rule] = Some(id);
        id
    }

    pub fn rule_stop(&mut self, rule: usize) -> StateId {
        self.state(rule, StateType::RuleStop)
    }

    /// Declare `end` as the block end of the block start `start`.
    pub fn block_end(&mut self, start: StateId, end: StateId) -> &mut Self {
        let linked = self
            .atn
            .require_state_mut(start)
            .map(|s| s.kind.set_block_end(end));
        let result = match linked {
            Ok(true) => Ok(()),
            Ok(false) => Err(AtnError::UnexpectedStateKind {
                state: start,
                expected: "block start state",
            }),
            Err(e) => Err(e),
        };
        self.record(result);
        self
    }

    /// Declare the loop-back state a loop end belongs to.
    pub fn loop_end(&mut self, loop_end: StateId, loop_back: StateId) -> &mut Self {
        let result = match self.atn.require_state_mut(loop_end).map(|s| &mut s.kind) {
            Ok(StateKind::LoopEnd { loop_back: slot }) => {
                *slot = Some(loop_back);
                Ok(())
            }
            Ok(_) => Err(AtnError::UnexpectedStateKind {
                state: loop_end,
                expected: "loop end state",
            }),
            Err(e) => Err(e),
        };
        self.record(result);
        self
    }

    pub fn edge(&mut self, from: StateId, transition: Transition) -> &mut Self {
        let result = self.atn.add_transition(from, transition);
        self.record(result);
        self
    }

    pub fn epsilon(&mut self, from: StateId, to: StateId) -> &mut Self {
        self.edge(from, Transition::epsilon(to))
    }

    /// Register `state` as the next decision.
    pub fn decision(&mut self, state: StateId) -> &mut Self {
        let result = self.atn.define_decision_state(state).map(|_| ());
        self.record(result);
        self
    }

    pub fn non_greedy(&mut self, state: StateId) -> &mut Self {
        let result = self
            .atn
            .require_state_mut(state)
            .and_then(|s| {
                s.kind
                    .decision_info_mut()
                    .ok_or(AtnError::UnexpectedStateKind {
                        state,
                        expected: "decision state",
                    })
            })
            .map(|info| info.non_greedy = true);
        self.record(result);
        self
    }

    /// Lexer grammars: the token type each rule produces, by rule index.
    pub fn rule_token_types(&mut self, token_types: Vec<i32>) -> &mut Self {
        self.rule_token_types = token_types;
        self
    }

    /// Lexer grammars: the table action transitions index into.
    pub fn lexer_actions(&mut self, actions: Vec<LexerAction>) -> &mut Self {
        self.atn.set_lexer_actions(actions);
        self
    }

    /// Lexer grammars: the start state of the next mode.
    pub fn mode_start(&mut self, state: StateId) -> &mut Self {
        self.atn.add_mode_start_state(state);
        self
    }

    /// Link and verify the automaton.
    pub fn build(self) -> Result<Atn, AtnError> {
        self.pending?;
        let mut atn = self.atn;
        let starts = self
            .rule_starts
            .iter()
            .enumerate()
            .map(|(rule, start)| start.ok_or(AtnError::MissingRuleStop { rule }))
            .collect::<Result<Vec<_>, _>>()?;
        atn.set_rule_start_states(starts);
        if atn.grammar_type == GrammarType::Lexer {
            atn.set_rule_token_types(self.rule_token_types);
        }
        link_rule_stop_states(&mut atn)?;
        derive_rule_stop_edges(&mut atn)?;
        link_blocks_and_loops(&mut atn)?;
        mark_precedence_decisions(&mut atn);
        verify(&atn)?;
        Ok(atn)
    }
}
