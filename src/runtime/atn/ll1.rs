//! Single-token lookahead computation over the automaton.
//!
//! Walks epsilon closures from a state, following rule invocations through an
//! explicit stack of return (follow) states, and collects the token types that
//! can be matched next.

use std::collections::HashSet;

use crate::runtime::misc::{Interval, IntervalSet};
use crate::runtime::token::{EOF, EPSILON, INVALID_TYPE, MIN_USER_TOKEN_TYPE};

use super::graph::Atn;
use super::state::{StateId, StateKind};
use super::transition::{Transition, TransitionKind};

/// Marker added to a lookahead set when a predicate blocked the walk.
pub const HIT_PRED: i32 = INVALID_TYPE;

/// Return-state stack of a walk. `bounded == false` means the bottom of the
/// stack is unknown, so reaching a rule end yields [`EPSILON`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LookContext {
    bounded: bool,
    stack: Vec<StateId>,
}

impl LookContext {
    fn is_unknown(&self) -> bool {
        !self.bounded && self.stack.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.bounded && self.stack.is_empty()
    }

    fn push(&self, follow: StateId) -> LookContext {
        let mut stack = self.stack.clone();
        stack.push(follow);
        LookContext {
            bounded: self.bounded,
            stack,
        }
    }
}

struct Walk {
    look: IntervalSet,
    busy: HashSet<(StateId, LookContext)>,
    called_rules: Vec<bool>,
    stop_state: Option<StateId>,
    see_thru_preds: bool,
    add_eof: bool,
    /// Evaluate precedence predicates met at this stack depth against the given precedence.
    precedence: Option<(i32, usize)>,
}

pub struct Ll1Analyzer<'a> {
    atn: &'a Atn,
}

impl<'a> Ll1Analyzer<'a> {
    pub fn new(atn: &'a Atn) -> Self {
        Ll1Analyzer { atn }
    }

    fn walk(&self, stop_state: Option<StateId>, see_thru_preds: bool, add_eof: bool) -> Walk {
        Walk {
            look: IntervalSet::new(),
            busy: HashSet::new(),
            called_rules: vec![false; self.atn.rule_count()],
            stop_state,
            see_thru_preds,
            add_eof,
            precedence: None,
        }
    }

    /// Lookahead set per alternative of a decision state.
    ///
    /// An alternative gets `None` when nothing was found or a predicate stood
    /// in the way.
    pub fn decision_lookahead(&self, state: StateId) -> Vec<Option<IntervalSet>> {
        let Some(s) = self.atn.state(state) else {
            return Vec::new();
        };
        s.transitions()
            .iter()
            .map(|t| {
                let mut walk = self.walk(None, false, false);
                let ctx = LookContext {
                    bounded: true,
                    stack: Vec::new(),
                };
                self.look_from(&mut walk, t.target, &ctx);
                if walk.look.is_nil() || walk.look.contains(HIT_PRED) {
                    None
                } else {
                    Some(walk.look)
                }
            })
            .collect()
    }

    /// Tokens that can follow `state`.
    ///
    /// Without a context (`None`) the walk stays inside the rule and records
    /// [`EPSILON`] if the rule end is reachable. With a follow stack
    /// (outermost first) it continues into the callers and records [`EOF`]
    /// when the outermost rule can end. Reaching `stop_state` acts like
    /// reaching a rule end.
    pub fn look(&self, state: StateId, stop_state: Option<StateId>, follow_stack: Option<&[StateId]>) -> IntervalSet {
        let mut walk = self.walk(stop_state, true, true);
        let ctx = match follow_stack {
            Some(stack) => LookContext {
                bounded: true,
                stack: stack.to_vec(),
            },
            None => LookContext {
                bounded: false,
                stack: Vec::new(),
            },
        };
        self.look_from(&mut walk, state, &ctx);
        walk.look
    }

    /// Lookahead of one alternative edge, evaluating precedence predicates of
    /// the current invocation against `precedence`.
    pub fn alternative_lookahead(&self, transition: &Transition, follow_stack: &[StateId], precedence: i32) -> IntervalSet {
        let mut walk = self.walk(None, true, true);
        walk.precedence = Some((precedence, follow_stack.len()));
        let ctx = LookContext {
            bounded: true,
            stack: follow_stack.to_vec(),
        };
        self.follow_transition(&mut walk, transition, &ctx);
        walk.look
    }

    fn look_from(&self, walk: &mut Walk, s: StateId, ctx: &LookContext) {
        if !walk.busy.insert((s, ctx.clone())) {
            return;
        }
        if walk.stop_state == Some(s) {
            if ctx.is_unknown() {
                walk.look.insert(Interval::new(EPSILON, EPSILON));
                return;
            }
            if ctx.is_empty() && walk.add_eof {
                walk.look.insert(Interval::new(EOF, EOF));
                return;
            }
        }
        let Some(state) = self.atn.state(s) else {
            return;
        };
        if matches!(state.kind, StateKind::RuleStop) {
            if ctx.is_unknown() {
                walk.look.insert(Interval::new(EPSILON, EPSILON));
                return;
            }
            if ctx.is_empty() && walk.add_eof {
                walk.look.insert(Interval::new(EOF, EOF));
                return;
            }
            if let Some((&return_state, rest)) = ctx.stack.split_last() {
                let rule = state.rule_index;
                let was_called = walk.called_rules.get(rule).copied().unwrap_or(false);
                if let Some(flag) = walk.called_rules.get_mut(rule) {
                    *flag = false;
                }
                let parent = LookContext {
                    bounded: ctx.bounded,
                    stack: rest.to_vec(),
                };
                self.look_from(walk, return_state, &parent);
                if was_called {
                    if let Some(flag) = walk.called_rules.get_mut(rule) {
                        *flag = true;
                    }
                }
                return;
            }
        }
        for t in state.transitions() {
            self.follow_transition(walk, t, ctx);
        }
    }

    fn follow_transition(&self, walk: &mut Walk, t: &Transition, ctx: &LookContext) {
        match &t.kind {
            TransitionKind::Rule { follow_state, .. } => {
                let Some(rule) = self.atn.state(t.target).map(|s| s.rule_index) else {
                    return;
                };
                if walk.called_rules.get(rule).copied().unwrap_or(false) {
                    return;
                }
                let callee = ctx.push(*follow_state);
                if let Some(flag) = walk.called_rules.get_mut(rule) {
                    *flag = true;
                }
                self.look_from(walk, t.target, &callee);
                if let Some(flag) = walk.called_rules.get_mut(rule) {
                    *flag = false;
                }
            }
            TransitionKind::Precedence { precedence } => match walk.precedence {
                Some((current, depth)) if ctx.stack.len() == depth => {
                    if *precedence >= current {
                        self.look_from(walk, t.target, ctx);
                    }
                }
                _ if walk.see_thru_preds => self.look_from(walk, t.target, ctx),
                _ => walk.look.insert(Interval::new(HIT_PRED, HIT_PRED)),
            },
            TransitionKind::Predicate { .. } => {
                if walk.see_thru_preds {
                    self.look_from(walk, t.target, ctx);
                } else {
                    walk.look.insert(Interval::new(HIT_PRED, HIT_PRED));
                }
            }
            TransitionKind::Epsilon { .. } | TransitionKind::Action { .. } => {
                self.look_from(walk, t.target, ctx);
            }
            TransitionKind::Wildcard => {
                walk.look
                    .insert_all(&IntervalSet::of_range(MIN_USER_TOKEN_TYPE, self.atn.max_token_type));
            }
            TransitionKind::NotSet { set } => {
                let vocabulary = IntervalSet::of_range(MIN_USER_TOKEN_TYPE, self.atn.max_token_type);
                walk.look.insert_all(&set.complement(&vocabulary));
            }
            TransitionKind::Atom { .. } | TransitionKind::Range { .. } | TransitionKind::Set { .. } => {
                if let Some(label) = t.label() {
                    walk.look.insert_all(&label);
                }
            }
        }
    }
}
