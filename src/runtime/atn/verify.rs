//! Structural invariants of a linked automaton.

use super::error::AtnError;
use super::graph::Atn;
use super::state::{AtnState, StateKind};

fn check(state: &AtnState, ok: bool, condition: &'static str) -> Result<(), AtnError> {
    if ok {
        Ok(())
    } else {
        Err(AtnError::Invariant {
            state: state.state_number,
            condition,
        })
    }
}

fn target_kind<'a>(atn: &'a Atn, state: &AtnState, i: usize) -> Option<&'a StateKind> {
    state
        .transition(i)
        .and_then(|t| atn.state(t.target))
        .map(|s| &s.kind)
}

/// Check every live state; the first violation is returned.
pub fn verify(atn: &Atn) -> Result<(), AtnError> {
    for state in atn.states() {
        check(
            state,
            state.only_has_epsilon_transitions() || state.transition_count() <= 1,
            "non-epsilon states have at most one transition",
        )?;

        match &state.kind {
            StateKind::PlusBlockStart { loop_back, .. } => {
                check(state, loop_back.is_some(), "plus block start has a loop-back state")?;
            }
            StateKind::StarLoopEntry { loop_back, .. } => {
                check(state, loop_back.is_some(), "star loop entry has a loop-back state")?;
                check(
                    state,
                    state.transition_count() == 2,
                    "star loop entry has exactly two transitions",
                )?;
                match target_kind(atn, state, 0) {
                    Some(StateKind::StarBlockStart { .. }) => {
                        check(
                            state,
                            matches!(target_kind(atn, state, 1), Some(StateKind::LoopEnd { .. })),
                            "greedy star loop exits to a loop end",
                        )?;
                        check(state, !state.is_non_greedy(), "greedy star loop enters the block first")?;
                    }
                    Some(StateKind::LoopEnd { .. }) => {
                        check(
                            state,
                            matches!(target_kind(atn, state, 1), Some(StateKind::StarBlockStart { .. })),
                            "non-greedy star loop enters the block second",
                        )?;
                        check(state, state.is_non_greedy(), "non-greedy star loop exits first")?;
                    }
                    _ => {
                        return Err(AtnError::Invariant {
                            state: state.state_number,
                            condition: "star loop entry leads to a star block start and a loop end",
                        })
                    }
                }
            }
            StateKind::StarLoopback => {
                check(state, state.transition_count() == 1, "star loop-back has one transition")?;
                check(
                    state,
                    matches!(target_kind(atn, state, 0), Some(StateKind::StarLoopEntry { .. })),
                    "star loop-back returns to a star loop entry",
                )?;
            }
            StateKind::LoopEnd { loop_back } => {
                check(state, loop_back.is_some(), "loop end has a loop-back state")?;
            }
            StateKind::RuleStart { stop_state, .. } => {
                check(state, stop_state.is_some(), "rule start has a stop state")?;
            }
            StateKind::BlockEnd { start_state } => {
                check(state, start_state.is_some(), "block end has a start state")?;
            }
            _ => {}
        }

        if state.kind.is_block_start() {
            check(state, state.kind.block_end().is_some(), "block start has an end state")?;
        }

        if state.kind.is_decision() {
            check(
                state,
                state.transition_count() <= 1 || state.decision().is_some(),
                "decision state with several transitions has a decision number",
            )?;
        } else {
            check(
                state,
                state.transition_count() <= 1 || matches!(state.kind, StateKind::RuleStop),
                "only rule stop and decision states branch",
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::atn::{GrammarType, Transition};
    use crate::runtime::testing::expr;

    #[test]
    fn sample_grammar_is_well_formed() {
        assert_eq!(verify(&expr::ATN), Ok(()));
    }

    #[test]
    fn branching_basic_state_is_rejected() {
        let mut atn = Atn::new(GrammarType::Parser, 2);
        let a = atn.add_state(0, StateKind::Basic);
        let b = atn.add_state(0, StateKind::Basic);
        let c = atn.add_state(0, StateKind::Basic);
        atn.add_transition(a, Transition::epsilon(b)).unwrap();
        atn.add_transition(a, Transition::epsilon(c)).unwrap();
        assert_eq!(
            verify(&atn),
            Err(AtnError::Invariant {
                state: a,
                condition: "only rule stop and decision states branch"
            })
        );
    }

    #[test]
    fn unlinked_loop_end_is_rejected() {
        let mut atn = Atn::new(GrammarType::Parser, 2);
        let end = atn.add_state(0, StateKind::LoopEnd { loop_back: None });
        assert!(matches!(
            verify(&atn),
            Err(AtnError::Invariant { state, .. }) if state == end
        ));
    }
}
