//! Encoding of an automaton into the flat integer format.
//!
//! Layout, in order: preamble (version, grammar type, max token type), states,
//! non-greedy decision states, left-recursive rule starts, rules, modes, sets,
//! edges, decisions and (lexers only) lexer actions. Rule-stop return edges are
//! not written; the decoder derives them from the rule-invocation edges.

use std::collections::HashMap;

use crate::runtime::misc::IntervalSet;
use crate::runtime::token::EOF;

use super::deserializer::SERIALIZED_VERSION;
use super::error::AtnError;
use super::graph::{Atn, GrammarType};
use super::state::{StateKind, StateType};
use super::transition::{Transition, TransitionKind};
use super::words::encode_words;

pub fn serialize(atn: &Atn) -> Result<Vec<i32>, AtnError> {
    Serializer::new(atn).serialize()
}

/// [`serialize`] followed by 16-bit word packing.
pub fn serialize_to_words(atn: &Atn) -> Result<Vec<u16>, AtnError> {
    encode_words(&serialize(atn)?)
}

fn int(what: &'static str, value: usize) -> Result<i32, AtnError> {
    i32::try_from(value).map_err(|_| AtnError::ValueOutOfRange {
        what,
        value: value as i64,
    })
}

struct Serializer<'a> {
    atn: &'a Atn,
    data: Vec<i32>,
    sets: Vec<IntervalSet>,
    set_indices: HashMap<IntervalSet, usize>,
}

impl<'a> Serializer<'a> {
    fn new(atn: &'a Atn) -> Self {
        Serializer {
            atn,
            data: Vec::new(),
            sets: Vec::new(),
            set_indices: HashMap::new(),
        }
    }

    fn serialize(mut self) -> Result<Vec<i32>, AtnError> {
        self.data.push(SERIALIZED_VERSION);
        self.data.push(self.atn.grammar_type as i32);
        self.data.push(self.atn.max_token_type);

        self.add_states()?;
        self.add_flagged_states()?;
        self.add_rules()?;
        self.add_modes()?;
        self.add_sets();
        self.add_edges()?;
        self.add_decisions()?;
        self.add_lexer_actions()?;
        Ok(self.data)
    }

    fn add_states(&mut self) -> Result<(), AtnError> {
        let atn = self.atn;
        self.data.push(int("state count", atn.state_count())?);
        for slot in atn.state_slots() {
            let Some(state) = slot else {
                self.data.push(StateType::Invalid.code());
                continue;
            };
            self.data.push(state.state_type().code());
            self.data.push(int("rule index", state.rule_index)?);
            let link = match &state.kind {
                StateKind::LoopEnd { loop_back } => Some(loop_back.ok_or(AtnError::Invariant {
                    state: state.state_number,
                    condition: "loop end has a loop-back state",
                })?),
                kind if kind.is_block_start() => Some(kind.block_end().ok_or(AtnError::Invariant {
                    state: state.state_number,
                    condition: "block start has an end state",
                })?),
                _ => None,
            };
            if let Some(link) = link {
                self.data.push(int("state reference", link)?);
            }
            for t in state.transitions() {
                if let TransitionKind::Set { set } | TransitionKind::NotSet { set } = &t.kind {
                    if !self.set_indices.contains_key(set) {
                        self.set_indices.insert(set.clone(), self.sets.len());
                        self.sets.push(set.clone());
                    }
                }
            }
        }
        Ok(())
    }

    /// Non-greedy decision states, then left-recursive rule starts.
    fn add_flagged_states(&mut self) -> Result<(), AtnError> {
        let non_greedy: Vec<usize> = self
            .atn
            .states()
            .filter(|s| s.is_non_greedy())
            .map(|s| s.state_number)
            .collect();
        let precedence: Vec<usize> = self
            .atn
            .states()
            .filter(|s| {
                matches!(
                    s.kind,
                    StateKind::RuleStart {
                        is_left_recursive: true,
                        ..
                    }
                )
            })
            .map(|s| s.state_number)
            .collect();
        for list in [non_greedy, precedence] {
            self.data.push(int("state count", list.len())?);
            for id in list {
                self.data.push(int("state reference", id)?);
            }
        }
        Ok(())
    }

    fn add_rules(&mut self) -> Result<(), AtnError> {
        let atn = self.atn;
        self.data.push(int("rule count", atn.rule_count())?);
        for (rule, &start) in atn.rule_start_states().iter().enumerate() {
            self.data.push(int("state reference", start)?);
            if atn.grammar_type == GrammarType::Lexer {
                let token_type = atn
                    .rule_token_type(rule)
                    .ok_or(AtnError::ValueOutOfRange {
                        what: "lexer rule token type",
                        value: rule as i64,
                    })?;
                self.data.push(token_type);
            }
        }
        Ok(())
    }

    fn add_modes(&mut self) -> Result<(), AtnError> {
        let modes = self.atn.mode_start_states();
        self.data.push(int("mode count", modes.len())?);
        for &id in modes {
            self.data.push(int("state reference", id)?);
        }
        Ok(())
    }

    /// Each set is written as interval count, an EOF flag and the interval
    /// bounds. EOF is carried by the flag only.
    fn add_sets(&mut self) {
        self.data.push(self.sets.len() as i32);
        for set in &self.sets {
            let intervals = set.intervals();
            let contains_eof = set.contains(EOF);
            let count = if contains_eof && intervals.first().is_some_and(|i| i.b == EOF) {
                intervals.len() - 1
            } else {
                intervals.len()
            };
            self.data.push(count as i32);
            self.data.push(i32::from(contains_eof));
            for interval in intervals {
                if interval.a == EOF {
                    if interval.b == EOF {
                        continue;
                    }
                    self.data.push(0);
                } else {
                    self.data.push(interval.a);
                }
                self.data.push(interval.b);
            }
        }
    }

    fn add_edges(&mut self) -> Result<(), AtnError> {
        let atn = self.atn;
        let sources: Vec<_> = atn
            .states()
            .filter(|s| s.state_type() != StateType::RuleStop)
            .collect();
        let count: usize = sources.iter().map(|s| s.transition_count()).sum();
        self.data.push(int("edge count", count)?);
        for state in sources {
            for t in state.transitions() {
                if atn.state(t.target).is_none() {
                    return Err(AtnError::RemovedStateTarget { target: t.target });
                }
                let (target, args) = self.edge_arguments(t)?;
                self.data.push(int("state reference", state.state_number)?);
                self.data.push(int("state reference", target)?);
                self.data.push(t.transition_type().code());
                self.data.extend(args);
            }
        }
        Ok(())
    }

    /// Serialized target and the three edge arguments.
    fn edge_arguments(&self, t: &Transition) -> Result<(usize, [i32; 3]), AtnError> {
        let eof_aware = |label: i32, to: i32| {
            if label == EOF {
                [0, to, 1]
            } else {
                [label, to, 0]
            }
        };
        Ok(match &t.kind {
            TransitionKind::Epsilon { .. } | TransitionKind::Wildcard => (t.target, [0, 0, 0]),
            TransitionKind::Range { from, to } => (t.target, eof_aware(*from, *to)),
            TransitionKind::Atom { label } => (t.target, eof_aware(*label, 0)),
            TransitionKind::Rule {
                follow_state,
                rule_index,
                precedence,
            } => (
                *follow_state,
                [
                    int("state reference", t.target)?,
                    int("rule index", *rule_index)?,
                    *precedence,
                ],
            ),
            TransitionKind::Predicate {
                rule_index,
                pred_index,
                is_ctx_dependent,
            } => (
                t.target,
                [
                    int("rule index", *rule_index)?,
                    int("predicate index", *pred_index)?,
                    i32::from(*is_ctx_dependent),
                ],
            ),
            TransitionKind::Action {
                rule_index,
                action_index,
                is_ctx_dependent,
            } => (
                t.target,
                [
                    int("rule index", *rule_index)?,
                    *action_index,
                    i32::from(*is_ctx_dependent),
                ],
            ),
            TransitionKind::Precedence { precedence } => (t.target, [*precedence, 0, 0]),
            TransitionKind::Set { set } | TransitionKind::NotSet { set } => {
                let index = self.set_indices.get(set).copied().unwrap_or_default();
                (t.target, [int("set reference", index)?, 0, 0])
            }
        })
    }

    fn add_decisions(&mut self) -> Result<(), AtnError> {
        let decisions = self.atn.decision_states();
        self.data.push(int("decision count", decisions.len())?);
        for &id in decisions {
            self.data.push(int("state reference", id)?);
        }
        Ok(())
    }

    fn add_lexer_actions(&mut self) -> Result<(), AtnError> {
        if self.atn.grammar_type != GrammarType::Lexer {
            return Ok(());
        }
        let actions = self.atn.lexer_actions();
        self.data.push(int("lexer action count", actions.len())?);
        for action in actions {
            let (data1, data2) = action.payload();
            self.data.push(action.action_type() as i32);
            self.data.push(data1);
            self.data.push(data2);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::misc::Interval;

    #[test]
    fn eof_sets_use_the_flag() {
        let mut atn = Atn::new(GrammarType::Parser, 5);
        let a = atn.add_state(0, StateKind::Basic);
        let b = atn.add_state(0, StateKind::Basic);
        let mut set = IntervalSet::of_range(EOF, 3);
        set.insert(Interval::new(5, 5));
        atn.add_transition(a, Transition::set(b, set)).unwrap();
        let data = serialize(&atn).unwrap();
        // preamble, 2 states, 0 non-greedy, 0 precedence, 0 rules, 0 modes, then sets.
        let sets = &data[3 + 1 + 4 + 1 + 1 + 1 + 1..];
        assert_eq!(&sets[..7], &[1, 2, 1, 0, 3, 5, 5]);
    }

    #[test]
    fn single_eof_interval_is_dropped() {
        let mut atn = Atn::new(GrammarType::Parser, 5);
        let a = atn.add_state(0, StateKind::Basic);
        let b = atn.add_state(0, StateKind::Basic);
        let mut set = IntervalSet::of(EOF);
        set.insert(Interval::new(2, 4));
        atn.add_transition(a, Transition::not_set(b, set)).unwrap();
        let data = serialize(&atn).unwrap();
        let sets = &data[3 + 1 + 4 + 1 + 1 + 1 + 1..];
        assert_eq!(&sets[..5], &[1, 1, 1, 2, 4]);
    }

    #[test]
    fn edges_to_removed_states_are_rejected() {
        let mut atn = Atn::new(GrammarType::Parser, 1);
        let a = atn.add_state(0, StateKind::Basic);
        let b = atn.add_state(0, StateKind::Basic);
        atn.add_transition(a, Transition::epsilon(b)).unwrap();
        atn.remove_state(b);
        assert_eq!(serialize(&atn), Err(AtnError::RemovedStateTarget { target: b }));
    }
}
