//! Automaton transitions.

use crate::runtime::misc::IntervalSet;

use super::state::StateId;

/// Serialized transition type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionType {
    Epsilon = 1,
    Range = 2,
    Rule = 3,
    Predicate = 4,
    Atom = 5,
    Action = 6,
    Set = 7,
    NotSet = 8,
    Wildcard = 9,
    Precedence = 10,
}

impl TransitionType {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => TransitionType::Epsilon,
            2 => TransitionType::Range,
            3 => TransitionType::Rule,
            4 => TransitionType::Predicate,
            5 => TransitionType::Atom,
            6 => TransitionType::Action,
            7 => TransitionType::Set,
            8 => TransitionType::NotSet,
            9 => TransitionType::Wildcard,
            10 => TransitionType::Precedence,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionKind {
    Epsilon {
        /// Set on rule-stop return edges of a left-recursive rule invoked at precedence 0.
        outermost_precedence_return: Option<usize>,
    },
    Range {
        from: i32,
        to: i32,
    },
    /// `target` is the invoked rule's start state.
    Rule {
        follow_state: StateId,
        rule_index: usize,
        precedence: i32,
    },
    Predicate {
        rule_index: usize,
        pred_index: usize,
        is_ctx_dependent: bool,
    },
    Atom {
        label: i32,
    },
    Action {
        rule_index: usize,
        action_index: i32,
        is_ctx_dependent: bool,
    },
    Set {
        set: IntervalSet,
    },
    NotSet {
        set: IntervalSet,
    },
    Wildcard,
    Precedence {
        precedence: i32,
    },
}

/// A directed edge owned by its source state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: StateId,
    pub kind: TransitionKind,
}

impl Transition {
    pub fn new(target: StateId, kind: TransitionKind) -> Self {
        Transition { target, kind }
    }

    pub fn epsilon(target: StateId) -> Self {
        Self::new(
            target,
            TransitionKind::Epsilon {
                outermost_precedence_return: None,
            },
        )
    }

    pub fn atom(target: StateId, label: i32) -> Self {
        Self::new(target, TransitionKind::Atom { label })
    }

    pub fn range(target: StateId, from: i32, to: i32) -> Self {
        Self::new(target, TransitionKind::Range { from, to })
    }

    pub fn rule(rule_start: StateId, rule_index: usize, precedence: i32, follow_state: StateId) -> Self {
        Self::new(
            rule_start,
            TransitionKind::Rule {
                follow_state,
                rule_index,
                precedence,
            },
        )
    }

    pub fn set(target: StateId, set: IntervalSet) -> Self {
        Self::new(target, TransitionKind::Set { set })
    }

    pub fn not_set(target: StateId, set: IntervalSet) -> Self {
        Self::new(target, TransitionKind::NotSet { set })
    }

    pub fn wildcard(target: StateId) -> Self {
        Self::new(target, TransitionKind::Wildcard)
    }

    pub fn predicate(target: StateId, rule_index: usize, pred_index: usize, is_ctx_dependent: bool) -> Self {
        Self::new(
            target,
            TransitionKind::Predicate {
                rule_index,
                pred_index,
                is_ctx_dependent,
            },
        )
    }

    pub fn precedence(target: StateId, precedence: i32) -> Self {
        Self::new(target, TransitionKind::Precedence { precedence })
    }

    pub fn action(target: StateId, rule_index: usize, action_index: i32, is_ctx_dependent: bool) -> Self {
        Self::new(
            target,
            TransitionKind::Action {
                rule_index,
                action_index,
                is_ctx_dependent,
            },
        )
    }

    pub fn transition_type(&self) -> TransitionType {
        match self.kind {
            TransitionKind::Epsilon { .. } => TransitionType::Epsilon,
            TransitionKind::Range { .. } => TransitionType::Range,
            TransitionKind::Rule { .. } => TransitionType::Rule,
            TransitionKind::Predicate { .. } => TransitionType::Predicate,
            TransitionKind::Atom { .. } => TransitionType::Atom,
            TransitionKind::Action { .. } => TransitionType::Action,
            TransitionKind::Set { .. } => TransitionType::Set,
            TransitionKind::NotSet { .. } => TransitionType::NotSet,
            TransitionKind::Wildcard => TransitionType::Wildcard,
            TransitionKind::Precedence { .. } => TransitionType::Precedence,
        }
    }

    /// Traversed without consuming input.
    pub fn is_epsilon(&self) -> bool {
        matches!(
            self.kind,
            TransitionKind::Epsilon { .. }
                | TransitionKind::Rule { .. }
                | TransitionKind::Predicate { .. }
                | TransitionKind::Action { .. }
                | TransitionKind::Precedence { .. }
        )
    }

    /// Symbols this edge is labelled with, if it has a label.
    pub fn label(&self) -> Option<IntervalSet> {
        match &self.kind {
            TransitionKind::Atom { label } => Some(IntervalSet::of(*label)),
            TransitionKind::Range { from, to } => Some(IntervalSet::of_range(*from, *to)),
            TransitionKind::Set { set } | TransitionKind::NotSet { set } => Some(set.clone()),
            _ => None,
        }
    }

    /// Whether `symbol` can be consumed along this edge given the vocabulary bounds.
    pub fn matches(&self, symbol: i32, min_vocab: i32, max_vocab: i32) -> bool {
        match &self.kind {
            TransitionKind::Atom { label } => *label == symbol,
            TransitionKind::Range { from, to } => *from <= symbol && symbol <= *to,
            TransitionKind::Set { set } => set.contains(symbol),
            TransitionKind::NotSet { set } => {
                symbol >= min_vocab && symbol <= max_vocab && !set.contains(symbol)
            }
            TransitionKind::Wildcard => symbol >= min_vocab && symbol <= max_vocab,
            _ => false,
        }
    }

    /// Rule-invocation edge's follow state.
    pub fn follow_state(&self) -> Option<StateId> {
        match self.kind {
            TransitionKind::Rule { follow_state, .. } => Some(follow_state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_family() {
        assert!(Transition::epsilon(1).is_epsilon());
        assert!(Transition::rule(0, 0, 0, 3).is_epsilon());
        assert!(Transition::precedence(1, 2).is_epsilon());
        assert!(!Transition::atom(1, 4).is_epsilon());
        assert!(!Transition::wildcard(1).is_epsilon());
    }

    #[test]
    fn not_set_matches_within_vocabulary() {
        let t = Transition::not_set(1, IntervalSet::of_range(2, 3));
        assert!(t.matches(1, 1, 5));
        assert!(!t.matches(2, 1, 5));
        assert!(!t.matches(6, 1, 5));
    }

    #[test]
    fn tags_round_trip() {
        for code in 1..=10 {
            let tag = TransitionType::from_code(code).map(TransitionType::code);
            assert_eq!(tag, Some(code));
        }
        assert_eq!(TransitionType::from_code(11), None);
    }
}
