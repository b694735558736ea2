//! Decoding of the flat integer format into an [`Atn`].
//!
//! Decoding never panics on malformed input: truncated data, unknown tags and
//! references to missing or mistyped states all surface as [`AtnError`]s.
//!
//! The derivation passes (rule-stop links and return edges, block and loop
//! back-links, precedence decisions) are shared with
//! [`crate::runtime::testing::AtnBuilder`], so hand-built automata end up in
//! the same shape as decoded ones.

use tracing::debug;

use crate::runtime::misc::{Interval, IntervalSet};
use crate::runtime::token::EOF;

use super::error::AtnError;
use super::graph::{Atn, GrammarType};
use super::lexer_action::LexerAction;
use super::options::DeserializationOptions;
use super::state::{StateId, StateKind, StateType};
use super::transition::{Transition, TransitionKind, TransitionType};
use super::verify::verify;
use super::words::decode_words;

pub const SERIALIZED_VERSION: i32 = 4;

/// Cursor over serialized data.
struct Reader<'a> {
    data: &'a [i32],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [i32]) -> Self {
        Reader { data, pos: 0 }
    }

    fn next(&mut self) -> Result<i32, AtnError> {
        let value = *self
            .data
            .get(self.pos)
            .ok_or(AtnError::UnexpectedEnd { offset: self.pos })?;
        self.pos += 1;
        Ok(value)
    }

    /// A count, index or state reference; must not be negative.
    fn index(&mut self, what: &'static str) -> Result<usize, AtnError> {
        let value = self.next()?;
        to_index(what, value)
    }
}

fn to_index(what: &'static str, value: i32) -> Result<usize, AtnError> {
    usize::try_from(value).map_err(|_| AtnError::ValueOutOfRange {
        what,
        value: i64::from(value),
    })
}

fn unexpected(state: StateId, expected: &'static str) -> AtnError {
    AtnError::UnexpectedStateKind { state, expected }
}

#[derive(Debug, Clone, Default)]
pub struct AtnDeserializer {
    options: DeserializationOptions,
}

impl AtnDeserializer {
    pub fn new(options: DeserializationOptions) -> Self {
        AtnDeserializer { options }
    }

    pub fn options(&self) -> &DeserializationOptions {
        &self.options
    }

    /// Decode 16-bit packed data (see [`super::encode_words`]).
    pub fn deserialize_words(&self, words: &[u16]) -> Result<Atn, AtnError> {
        self.deserialize(&decode_words(words)?)
    }

    pub fn deserialize(&self, data: &[i32]) -> Result<Atn, AtnError> {
        let mut r = Reader::new(data);
        let version = r.next()?;
        if version != SERIALIZED_VERSION {
            return Err(AtnError::UnsupportedVersion {
                found: version,
                expected: SERIALIZED_VERSION,
            });
        }
        let grammar_code = r.next()?;
        let grammar_type =
            GrammarType::from_code(grammar_code).ok_or(AtnError::InvalidGrammarType(grammar_code))?;
        let max_token_type = r.next()?;
        let mut atn = Atn::new(grammar_type, max_token_type);

        read_states(&mut r, &mut atn)?;
        read_non_greedy_states(&mut r, &mut atn)?;
        read_precedence_states(&mut r, &mut atn)?;
        read_rules(&mut r, &mut atn)?;
        link_rule_stop_states(&mut atn)?;
        read_modes(&mut r, &mut atn)?;
        let sets = read_sets(&mut r)?;
        read_edges(&mut r, &mut atn, &sets)?;
        derive_rule_stop_edges(&mut atn)?;
        link_blocks_and_loops(&mut atn)?;
        read_decisions(&mut r, &mut atn)?;
        if atn.grammar_type == GrammarType::Lexer {
            read_lexer_actions(&mut r, &mut atn)?;
        }
        mark_precedence_decisions(&mut atn);

        if self.options.verify_atn {
            verify(&atn)?;
        }
        if self.options.generate_rule_bypass_transitions && atn.grammar_type == GrammarType::Parser {
            generate_rule_bypass_transitions(&mut atn)?;
            if self.options.verify_atn {
                verify(&atn)?;
            }
        }

        debug!(
            states = atn.state_count(),
            rules = atn.rule_count(),
            decisions = atn.decision_count(),
            grammar = ?atn.grammar_type,
            bypass = self.options.generate_rule_bypass_transitions,
            "deserialized automaton"
        );
        Ok(atn)
    }
}

fn read_states(r: &mut Reader<'_>, atn: &mut Atn) -> Result<(), AtnError> {
    let mut loop_backs = Vec::new();
    let mut block_ends = Vec::new();
    let count = r.index("state count")?;
    for _ in 0..count {
        let code = r.next()?;
        let state_type = StateType::from_code(code).ok_or(AtnError::InvalidStateType(code))?;
        let Some(kind) = StateKind::placeholder(state_type) else {
            atn.add_removed_state();
            continue;
        };
        let rule_index = r.index("rule index")?;
        let is_block_start = kind.is_block_start();
        let id = atn.add_state(rule_index, kind);
        if state_type == StateType::LoopEnd {
            loop_backs.push((id, r.index("state reference")?));
        } else if is_block_start {
            block_ends.push((id, r.index("state reference")?));
        }
    }

    for (id, target) in loop_backs {
        atn.require_state(target)?;
        if let StateKind::LoopEnd { loop_back } = &mut atn.require_state_mut(id)?.kind {
            *loop_back = Some(target);
        }
    }
    for (id, end) in block_ends {
        if !matches!(atn.require_state(end)?.kind, StateKind::BlockEnd { .. }) {
            return Err(unexpected(end, "block end state"));
        }
        atn.require_state_mut(id)?.kind.set_block_end(end);
    }
    Ok(())
}

fn read_non_greedy_states(r: &mut Reader<'_>, atn: &mut Atn) -> Result<(), AtnError> {
    let count = r.index("state count")?;
    for _ in 0..count {
        let id = r.index("state reference")?;
        let info = atn
            .require_state_mut(id)?
            .kind
            .decision_info_mut()
            .ok_or(unexpected(id, "decision state"))?;
        info.non_greedy = true;
    }
    Ok(())
}

fn read_precedence_states(r: &mut Reader<'_>, atn: &mut Atn) -> Result<(), AtnError> {
    let count = r.index("state count")?;
    for _ in 0..count {
        let id = r.index("state reference")?;
        match &mut atn.require_state_mut(id)?.kind {
            StateKind::RuleStart {
                is_left_recursive, ..
            } => *is_left_recursive = true,
            _ => return Err(unexpected(id, "rule start state")),
        }
    }
    Ok(())
}

fn read_rules(r: &mut Reader<'_>, atn: &mut Atn) -> Result<(), AtnError> {
    let count = r.index("rule count")?;
    let mut starts = Vec::new();
    let mut token_types = Vec::new();
    for _ in 0..count {
        let id = r.index("state reference")?;
        if !matches!(atn.require_state(id)?.kind, StateKind::RuleStart { .. }) {
            return Err(unexpected(id, "rule start state"));
        }
        starts.push(id);
        if atn.grammar_type == GrammarType::Lexer {
            token_types.push(r.next()?);
        }
    }
    atn.set_rule_start_states(starts);
    atn.set_rule_token_types(token_types);
    Ok(())
}

fn read_modes(r: &mut Reader<'_>, atn: &mut Atn) -> Result<(), AtnError> {
    let count = r.index("mode count")?;
    for _ in 0..count {
        let id = r.index("state reference")?;
        if !matches!(atn.require_state(id)?.kind, StateKind::TokensStart { .. }) {
            return Err(unexpected(id, "tokens start state"));
        }
        atn.add_mode_start_state(id);
    }
    Ok(())
}

fn read_sets(r: &mut Reader<'_>) -> Result<Vec<IntervalSet>, AtnError> {
    let count = r.index("set count")?;
    let mut sets = Vec::new();
    for _ in 0..count {
        let intervals = r.index("interval count")?;
        let mut set = IntervalSet::new();
        if r.next()? != 0 {
            set.insert(Interval::new(EOF, EOF));
        }
        for _ in 0..intervals {
            let a = r.next()?;
            let b = r.next()?;
            set.insert(Interval::new(a, b));
        }
        sets.push(set);
    }
    Ok(sets)
}

fn read_edges(r: &mut Reader<'_>, atn: &mut Atn, sets: &[IntervalSet]) -> Result<(), AtnError> {
    let count = r.index("edge count")?;
    for _ in 0..count {
        let src = r.index("state reference")?;
        let trg = r.index("state reference")?;
        let edge_type = r.next()?;
        let args = [r.next()?, r.next()?, r.next()?];
        let transition = edge_factory(atn, edge_type, trg, args, sets)?;
        atn.add_transition(src, transition)?;
    }
    Ok(())
}

fn edge_factory(
    atn: &Atn,
    edge_type: i32,
    trg: StateId,
    [arg1, arg2, arg3]: [i32; 3],
    sets: &[IntervalSet],
) -> Result<Transition, AtnError> {
    let tag = TransitionType::from_code(edge_type).ok_or(AtnError::InvalidTransitionType(edge_type))?;
    atn.require_state(trg)?;
    let set = |index: i32| {
        usize::try_from(index)
            .ok()
            .and_then(|i| sets.get(i))
            .cloned()
            .ok_or(AtnError::InvalidSetReference {
                index: i64::from(index),
            })
    };
    Ok(match tag {
        TransitionType::Epsilon => Transition::epsilon(trg),
        TransitionType::Range if arg3 != 0 => Transition::range(trg, EOF, arg2),
        TransitionType::Range => Transition::range(trg, arg1, arg2),
        TransitionType::Rule => {
            let rule_start = to_index("state reference", arg1)?;
            if !matches!(atn.require_state(rule_start)?.kind, StateKind::RuleStart { .. }) {
                return Err(unexpected(rule_start, "rule start state"));
            }
            Transition::rule(rule_start, to_index("rule index", arg2)?, arg3, trg)
        }
        TransitionType::Predicate => Transition::predicate(
            trg,
            to_index("rule index", arg1)?,
            to_index("predicate index", arg2)?,
            arg3 != 0,
        ),
        TransitionType::Precedence => Transition::precedence(trg, arg1),
        TransitionType::Atom if arg3 != 0 => Transition::atom(trg, EOF),
        TransitionType::Atom => Transition::atom(trg, arg1),
        TransitionType::Action => {
            Transition::action(trg, to_index("rule index", arg1)?, arg2, arg3 != 0)
        }
        TransitionType::Set => Transition::set(trg, set(arg1)?),
        TransitionType::NotSet => Transition::not_set(trg, set(arg1)?),
        TransitionType::Wildcard => Transition::wildcard(trg),
    })
}

fn read_decisions(r: &mut Reader<'_>, atn: &mut Atn) -> Result<(), AtnError> {
    let count = r.index("decision count")?;
    for _ in 0..count {
        let id = r.index("state reference")?;
        atn.define_decision_state(id)?;
    }
    Ok(())
}

fn read_lexer_actions(r: &mut Reader<'_>, atn: &mut Atn) -> Result<(), AtnError> {
    let count = r.index("lexer action count")?;
    let mut actions = Vec::new();
    for _ in 0..count {
        let code = r.next()?;
        let data1 = r.next()?;
        let data2 = r.next()?;
        actions.push(LexerAction::from_parts(code, data1, data2)?);
    }
    atn.set_lexer_actions(actions);
    Ok(())
}

/// Index the rule stop states by rule and link each rule start to its stop.
pub(crate) fn link_rule_stop_states(atn: &mut Atn) -> Result<(), AtnError> {
    let rules = atn.rule_count();
    let mut stops = vec![None; rules];
    for state in atn.states() {
        if state.state_type() != StateType::RuleStop {
            continue;
        }
        let slot = stops.get_mut(state.rule_index).ok_or(AtnError::ValueOutOfRange {
            what: "rule index",
            value: state.rule_index as i64,
        })?;
        *slot = Some(state.state_number);
    }
    let stops = stops
        .into_iter()
        .enumerate()
        .map(|(rule, stop)| stop.ok_or(AtnError::MissingRuleStop { rule }))
        .collect::<Result<Vec<_>, _>>()?;
    for (&start, &stop) in atn.rule_start_states().to_vec().iter().zip(&stops) {
        if let StateKind::RuleStart { stop_state, .. } = &mut atn.require_state_mut(start)?.kind {
            *stop_state = Some(stop);
        }
    }
    atn.set_rule_stop_states(stops);
    Ok(())
}

/// Give every rule stop state an epsilon edge back to the follow state of
/// each invocation of its rule.
pub(crate) fn derive_rule_stop_edges(atn: &mut Atn) -> Result<(), AtnError> {
    for (src, ordinal) in atn.rule_transitions() {
        let Some(t) = atn.state(src).and_then(|s| s.transition(ordinal)) else {
            continue;
        };
        let TransitionKind::Rule {
            follow_state,
            precedence,
            ..
        } = t.kind
        else {
            continue;
        };
        let rule = atn.require_state(t.target)?.rule_index;
        let outermost_precedence_return =
            (atn.is_left_recursive(rule) && precedence == 0).then_some(rule);
        let stop = atn
            .rule_stop_state(rule)
            .ok_or(AtnError::MissingRuleStop { rule })?;
        atn.add_transition(
            stop,
            Transition::new(
                follow_state,
                TransitionKind::Epsilon {
                    outermost_precedence_return,
                },
            ),
        )?;
    }
    Ok(())
}

/// Back-link block ends to their starts and loop entries to their loop-backs.
pub(crate) fn link_blocks_and_loops(atn: &mut Atn) -> Result<(), AtnError> {
    for id in 0..atn.state_count() {
        let Some(state) = atn.state(id) else {
            continue;
        };
        if state.kind.is_block_start() {
            let end = state.kind.block_end().ok_or(AtnError::Invariant {
                state: id,
                condition: "block start has an end state",
            })?;
            match &mut atn.require_state_mut(end)?.kind {
                StateKind::BlockEnd { start_state } if start_state.is_none() => {
                    *start_state = Some(id);
                }
                StateKind::BlockEnd { .. } => {
                    return Err(AtnError::Invariant {
                        state: end,
                        condition: "block end belongs to a single block start",
                    })
                }
                _ => return Err(unexpected(end, "block end state")),
            }
            continue;
        }
        let is_plus = match state.kind {
            StateKind::PlusLoopback { .. } => true,
            StateKind::StarLoopback => false,
            _ => continue,
        };
        let targets: Vec<StateId> = state.transitions().iter().map(|t| t.target).collect();
        for target in targets {
            match &mut atn.require_state_mut(target)?.kind {
                StateKind::PlusBlockStart { loop_back, .. } if is_plus => *loop_back = Some(id),
                StateKind::StarLoopEntry { loop_back, .. } if !is_plus => *loop_back = Some(id),
                _ => {}
            }
        }
    }
    Ok(())
}

/// Whether a star loop entry closes the prefix of a left-recursive rule: its
/// exit branch reaches the rule stop through an epsilon-only loop end.
fn ends_precedence_prefix(atn: &Atn, entry: StateId) -> bool {
    let Some(state) = atn.state(entry) else {
        return false;
    };
    if !matches!(state.kind, StateKind::StarLoopEntry { .. }) {
        return false;
    }
    let Some(loop_end) = state
        .transitions()
        .last()
        .and_then(|t| atn.state(t.target))
    else {
        return false;
    };
    matches!(loop_end.kind, StateKind::LoopEnd { .. })
        && loop_end.only_has_epsilon_transitions()
        && loop_end
            .transition(0)
            .and_then(|t| atn.state(t.target))
            .is_some_and(|s| s.state_type() == StateType::RuleStop)
}

/// The star loop entry deciding whether a left-recursive rule continues.
pub(crate) fn precedence_loop_entry(atn: &Atn, rule: usize) -> Option<StateId> {
    atn.states()
        .filter(|s| s.rule_index == rule)
        .map(|s| s.state_number)
        .find(|&id| ends_precedence_prefix(atn, id))
}

pub(crate) fn mark_precedence_decisions(atn: &mut Atn) {
    let entries: Vec<StateId> = atn
        .states()
        .filter(|s| atn.is_left_recursive(s.rule_index))
        .map(|s| s.state_number)
        .filter(|&id| ends_precedence_prefix(atn, id))
        .collect();
    for id in entries {
        if let Some(StateKind::StarLoopEntry {
            precedence_decision,
            ..
        }) = atn.state_mut(id).map(|s| &mut s.kind)
        {
            *precedence_decision = true;
        }
    }
}

/// Give every parser rule an extra alternative matching a single synthetic
/// token, so a rule's subtree can be stood in for by one token.
///
/// Rule `i` gets bypass token type `max_token_type + i + 1`. The rule's
/// original alternatives move into a new block, next to the bypass
/// alternative. For left-recursive rules the block wraps only the prefix up to
/// the precedence loop entry.
pub fn generate_rule_bypass_transitions(atn: &mut Atn) -> Result<(), AtnError> {
    let token_types = (0..atn.rule_count())
        .map(|rule| {
            i32::try_from(rule)
                .ok()
                .and_then(|r| atn.max_token_type.checked_add(r)?.checked_add(1))
                .ok_or(AtnError::ValueOutOfRange {
                    what: "bypass token type",
                    value: rule as i64,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    atn.set_rule_token_types(token_types.clone());

    let starts = atn.rule_start_states().to_vec();
    for (rule, (start, token_type)) in starts.into_iter().zip(token_types).enumerate() {
        add_rule_bypass(atn, rule, start, token_type)?;
    }
    Ok(())
}

fn add_rule_bypass(atn: &mut Atn, rule: usize, start: StateId, token_type: i32) -> Result<(), AtnError> {
    let bypass_start = atn.add_state(
        rule,
        StateKind::BasicBlockStart {
            decision: Default::default(),
            end_state: None,
        },
    );
    let bypass_stop = atn.add_state(
        rule,
        StateKind::BlockEnd {
            start_state: Some(bypass_start),
        },
    );
    atn.require_state_mut(bypass_start)?.kind.set_block_end(bypass_stop);
    atn.define_decision_state(bypass_start)?;

    let (end, excluded) = if atn.is_left_recursive(rule) {
        let entry = precedence_loop_entry(atn, rule).ok_or(AtnError::MissingPrecedencePrefix { rule })?;
        let loop_back = atn
            .require_state(entry)?
            .kind
            .loop_back()
            .ok_or(AtnError::Invariant {
                state: entry,
                condition: "star loop entry has a loop-back state",
            })?;
        (entry, Some((loop_back, 0)))
    } else {
        let stop = atn
            .rule_stop_state(rule)
            .ok_or(AtnError::MissingRuleStop { rule })?;
        (stop, None)
    };

    for id in 0..atn.state_count() {
        let Some(state) = atn.state_mut(id) else {
            continue;
        };
        for (ordinal, t) in state.transitions_mut().iter_mut().enumerate() {
            if excluded != Some((id, ordinal)) && t.target == end {
                t.target = bypass_stop;
            }
        }
    }

    let start_state = atn.require_state_mut(start)?;
    let mut moved = Vec::new();
    while let Some(t) = start_state.pop_transition() {
        moved.push(t);
    }
    for t in moved {
        atn.add_transition(bypass_start, t)?;
    }
    atn.add_transition(start, Transition::epsilon(bypass_start))?;
    atn.add_transition(bypass_stop, Transition::epsilon(end))?;

    let match_state = atn.add_state(rule, StateKind::Basic);
    atn.add_transition(match_state, Transition::atom(bypass_stop, token_type))?;
    atn.add_transition(bypass_start, Transition::epsilon(match_state))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::atn::serialize;
    use crate::runtime::testing::expr;
    use proptest::prelude::*;

    fn round_trip(atn: &Atn) -> Atn {
        let data = serialize(atn).unwrap();
        AtnDeserializer::default().deserialize(&data).unwrap()
    }

    #[test]
    fn decodes_what_was_encoded() {
        let decoded = round_trip(&expr::ATN);
        assert_eq!(decoded, *expr::ATN);
        assert_eq!(serialize(&decoded).unwrap(), serialize(&expr::ATN).unwrap());
    }

    #[test]
    fn precedence_loop_is_detected() {
        let decoded = round_trip(&expr::ATN);
        let entry = decoded.state(expr::states::EXPR_LOOP_ENTRY).unwrap();
        assert!(matches!(
            entry.kind,
            StateKind::StarLoopEntry {
                precedence_decision: true,
                ..
            }
        ));
    }

    #[test]
    fn return_edges_mark_outermost_precedence_calls() {
        let decoded = round_trip(&expr::ATN);
        let stop = decoded.rule_stop_state(expr::RULE_EXPR).unwrap();
        let outermost: Vec<_> = decoded
            .state(stop)
            .unwrap()
            .transitions()
            .iter()
            .map(|t| match t.kind {
                TransitionKind::Epsilon {
                    outermost_precedence_return,
                } => outermost_precedence_return,
                _ => panic!("rule stop edges are epsilon"),
            })
            .collect();
        // prog calls expr at precedence 0, the recursive call uses precedence 3.
        assert_eq!(outermost, vec![Some(expr::RULE_EXPR), None]);
    }

    #[test]
    fn rejects_other_versions() {
        let mut data = serialize(&expr::ATN).unwrap();
        data[0] = 3;
        assert_eq!(
            AtnDeserializer::default().deserialize(&data),
            Err(AtnError::UnsupportedVersion {
                found: 3,
                expected: SERIALIZED_VERSION
            })
        );
    }

    #[test]
    fn truncated_data_is_an_error() {
        let data = serialize(&expr::ATN).unwrap();
        for len in [0, 2, 5, data.len() / 2, data.len() - 1] {
            assert!(
                matches!(
                    AtnDeserializer::default().deserialize(&data[..len]),
                    Err(AtnError::UnexpectedEnd { .. })
                ),
                "length {len}"
            );
        }
    }

    #[test]
    fn unknown_edge_type_is_reported() {
        // One basic state with a self edge of type 11.
        let data = [SERIALIZED_VERSION, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 11, 0, 0, 0, 0];
        assert_eq!(
            AtnDeserializer::default().deserialize(&data),
            Err(AtnError::InvalidTransitionType(11))
        );
    }

    #[test]
    fn decision_list_must_name_decision_states() {
        let data = [SERIALIZED_VERSION, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0];
        assert_eq!(
            AtnDeserializer::default().deserialize(&data),
            Err(AtnError::UnexpectedStateKind {
                state: 0,
                expected: "decision state"
            })
        );
    }

    #[test]
    fn rule_without_stop_state_is_an_error() {
        // A rule start with no rule stop for its rule.
        let data = [SERIALIZED_VERSION, 1, 1, 1, 2, 0, 0, 0, 1, 0];
        assert_eq!(
            AtnDeserializer::default().deserialize(&data),
            Err(AtnError::MissingRuleStop { rule: 0 })
        );
    }

    #[test]
    fn bypass_alternatives_use_fresh_token_types() {
        let data = serialize(&expr::ATN).unwrap();
        let atn = AtnDeserializer::new(DeserializationOptions {
            verify_atn: true,
            generate_rule_bypass_transitions: true,
        })
        .deserialize(&data)
        .unwrap();
        let max = expr::ATN.max_token_type;
        assert_eq!(atn.rule_token_types(), &[max + 1, max + 2]);
        assert_eq!(atn.decision_count(), expr::ATN.decision_count() + 2);
    }

    #[test]
    fn bypass_without_precedence_loop_fails() {
        let mut atn = Atn::new(GrammarType::Parser, 1);
        let start = atn.add_state(
            0,
            StateKind::RuleStart {
                stop_state: None,
                is_left_recursive: true,
            },
        );
        let stop = atn.add_state(0, StateKind::RuleStop);
        atn.add_transition(start, Transition::epsilon(stop)).unwrap();
        atn.set_rule_start_states(vec![start]);
        link_rule_stop_states(&mut atn).unwrap();
        assert_eq!(
            generate_rule_bypass_transitions(&mut atn),
            Err(AtnError::MissingPrecedencePrefix { rule: 0 })
        );
    }

    proptest! {
        #[test]
        fn arbitrary_input_never_panics(tail in prop::collection::vec(-2i32..40, 0..120)) {
            let mut data = vec![SERIALIZED_VERSION, 1, 5];
            data.extend(tail);
            let _ = AtnDeserializer::default().deserialize(&data);
        }
    }
}
