//! Automaton states.
//!
//! A state is identified by its index in the automaton's state array. The
//! variant-specific data (block end links, loop-back links, decision numbers)
//! lives in [`StateKind`]; links to other states are plain indices.

use super::transition::Transition;

pub type StateId = usize;

/// Serialized state type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateType {
    Invalid = 0,
    Basic = 1,
    RuleStart = 2,
    BlockStart = 3,
    PlusBlockStart = 4,
    StarBlockStart = 5,
    TokenStart = 6,
    RuleStop = 7,
    BlockEnd = 8,
    StarLoopBack = 9,
    StarLoopEntry = 10,
    PlusLoopBack = 11,
    LoopEnd = 12,
}

impl StateType {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => StateType::Invalid,
            1 => StateType::Basic,
            2 => StateType::RuleStart,
            3 => StateType::BlockStart,
            4 => StateType::PlusBlockStart,
            5 => StateType::StarBlockStart,
            6 => StateType::TokenStart,
            7 => StateType::RuleStop,
            8 => StateType::BlockEnd,
            9 => StateType::StarLoopBack,
            10 => StateType::StarLoopEntry,
            11 => StateType::PlusLoopBack,
            12 => StateType::LoopEnd,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Data shared by every state that may require a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionInfo {
    /// Index into the automaton's decision list, once registered.
    pub decision: Option<usize>,
    pub non_greedy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateKind {
    Basic,
    RuleStart {
        stop_state: Option<StateId>,
        is_left_recursive: bool,
    },
    RuleStop,
    BasicBlockStart {
        decision: DecisionInfo,
        end_state: Option<StateId>,
    },
    PlusBlockStart {
        decision: DecisionInfo,
        end_state: Option<StateId>,
        loop_back: Option<StateId>,
    },
    StarBlockStart {
        decision: DecisionInfo,
        end_state: Option<StateId>,
    },
    TokensStart {
        decision: DecisionInfo,
    },
    BlockEnd {
        start_state: Option<StateId>,
    },
    StarLoopEntry {
        decision: DecisionInfo,
        loop_back: Option<StateId>,
        /// The loop decides whether a left-recursive rule continues.
        precedence_decision: bool,
    },
    StarLoopback,
    PlusLoopback {
        decision: DecisionInfo,
    },
    LoopEnd {
        loop_back: Option<StateId>,
    },
}

impl StateKind {
    /// Fresh, unlinked state of the given serialized type.
    pub fn placeholder(state_type: StateType) -> Option<Self> {
        let decision = DecisionInfo::default();
        Some(match state_type {
            StateType::Invalid => return None,
            StateType::Basic => StateKind::Basic,
            StateType::RuleStart => StateKind::RuleStart {
                stop_state: None,
                is_left_recursive: false,
            },
            StateType::BlockStart => StateKind::BasicBlockStart {
                decision,
                end_state: None,
            },
            StateType::PlusBlockStart => StateKind::PlusBlockStart {
                decision,
                end_state: None,
                loop_back: None,
            },
            StateType::StarBlockStart => StateKind::StarBlockStart {
                decision,
                end_state: None,
            },
            StateType::TokenStart => StateKind::TokensStart { decision },
            StateType::RuleStop => StateKind::RuleStop,
            StateType::BlockEnd => StateKind::BlockEnd { start_state: None },
            StateType::StarLoopBack => StateKind::StarLoopback,
            StateType::StarLoopEntry => StateKind::StarLoopEntry {
                decision,
                loop_back: None,
                precedence_decision: false,
            },
            StateType::PlusLoopBack => StateKind::PlusLoopback { decision },
            StateType::LoopEnd => StateKind::LoopEnd { loop_back: None },
        })
    }

    pub fn state_type(&self) -> StateType {
        match self {
            StateKind::Basic => StateType::Basic,
            StateKind::RuleStart { .. } => StateType::RuleStart,
            StateKind::RuleStop => StateType::RuleStop,
            StateKind::BasicBlockStart { .. } => StateType::BlockStart,
            StateKind::PlusBlockStart { .. } => StateType::PlusBlockStart,
            StateKind::StarBlockStart { .. } => StateType::StarBlockStart,
            StateKind::TokensStart { .. } => StateType::TokenStart,
            StateKind::BlockEnd { .. } => StateType::BlockEnd,
            StateKind::StarLoopEntry { .. } => StateType::StarLoopEntry,
            StateKind::StarLoopback => StateType::StarLoopBack,
            StateKind::PlusLoopback { .. } => StateType::PlusLoopBack,
            StateKind::LoopEnd { .. } => StateType::LoopEnd,
        }
    }

    pub fn decision_info(&self) -> Option<&DecisionInfo> {
        match self {
            StateKind::BasicBlockStart { decision, .. }
            | StateKind::PlusBlockStart { decision, .. }
            | StateKind::StarBlockStart { decision, .. }
            | StateKind::TokensStart { decision }
            | StateKind::StarLoopEntry { decision, .. }
            | StateKind::PlusLoopback { decision } => Some(decision),
            _ => None,
        }
    }

    pub fn decision_info_mut(&mut self) -> Option<&mut DecisionInfo> {
        match self {
            StateKind::BasicBlockStart { decision, .. }
            | StateKind::PlusBlockStart { decision, .. }
            | StateKind::StarBlockStart { decision, .. }
            | StateKind::TokensStart { decision }
            | StateKind::StarLoopEntry { decision, .. }
            | StateKind::PlusLoopback { decision } => Some(decision),
            _ => None,
        }
    }

    pub fn is_decision(&self) -> bool {
        self.decision_info().is_some()
    }

    pub fn is_block_start(&self) -> bool {
        matches!(
            self,
            StateKind::BasicBlockStart { .. }
                | StateKind::PlusBlockStart { .. }
                | StateKind::StarBlockStart { .. }
        )
    }

    /// End state of a block start.
    pub fn block_end(&self) -> Option<StateId> {
        match self {
            StateKind::BasicBlockStart { end_state, .. }
            | StateKind::PlusBlockStart { end_state, .. }
            | StateKind::StarBlockStart { end_state, .. } => *end_state,
            _ => None,
        }
    }

    pub(crate) fn set_block_end(&mut self, end: StateId) -> bool {
        match self {
            StateKind::BasicBlockStart { end_state, .. }
            | StateKind::PlusBlockStart { end_state, .. }
            | StateKind::StarBlockStart { end_state, .. } => {
                *end_state = Some(end);
                true
            }
            _ => false,
        }
    }

    /// Loop-back link of a plus block start, star loop entry or loop end.
    pub fn loop_back(&self) -> Option<StateId> {
        match self {
            StateKind::PlusBlockStart { loop_back, .. }
            | StateKind::StarLoopEntry { loop_back, .. }
            | StateKind::LoopEnd { loop_back } => *loop_back,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtnState {
    pub state_number: StateId,
    pub rule_index: usize,
    pub kind: StateKind,
    transitions: Vec<Transition>,
    epsilon_only: bool,
}

impl AtnState {
    pub fn new(state_number: StateId, rule_index: usize, kind: StateKind) -> Self {
        AtnState {
            state_number,
            rule_index,
            kind,
            transitions: Vec::new(),
            epsilon_only: false,
        }
    }

    pub fn state_type(&self) -> StateType {
        self.kind.state_type()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub(crate) fn transitions_mut(&mut self) -> &mut [Transition] {
        &mut self.transitions
    }

    pub fn transition(&self, i: usize) -> Option<&Transition> {
        self.transitions.get(i)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// All outgoing transitions are epsilon.
    pub fn only_has_epsilon_transitions(&self) -> bool {
        self.epsilon_only
    }

    /// Append a transition unless an equivalent one to the same target exists.
    ///
    /// Returns true when the state ended up mixing epsilon and non-epsilon edges.
    pub(crate) fn add_transition(&mut self, t: Transition) -> bool {
        let mut mixed = false;
        if self.transitions.is_empty() {
            self.epsilon_only = t.is_epsilon();
        } else if self.epsilon_only != t.is_epsilon() {
            self.epsilon_only = false;
            mixed = true;
        }
        let already_present = self.transitions.iter().any(|existing| {
            existing.target == t.target
                && match (existing.label(), t.label()) {
                    (Some(a), Some(b)) => a == b,
                    _ => existing.is_epsilon() && t.is_epsilon(),
                }
        });
        if !already_present {
            self.transitions.push(t);
        }
        mixed
    }

    pub(crate) fn pop_transition(&mut self) -> Option<Transition> {
        self.transitions.pop()
    }

    pub fn decision(&self) -> Option<usize> {
        self.kind.decision_info().and_then(|d| d.decision)
    }

    pub fn is_non_greedy(&self) -> bool {
        self.kind.decision_info().is_some_and(|d| d.non_greedy)
    }
}
