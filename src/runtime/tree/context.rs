//! Rule contexts and tree nodes.

use std::fmt;
use std::sync::Arc;

use crate::runtime::error::RecognitionError;
use crate::runtime::token::{TokenRef, EOF};

/// Handle of a rule context inside a [`super::ParseTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub(crate) usize);

impl ContextId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A leaf wrapping one token. Error nodes use the same payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalNode {
    pub symbol: TokenRef,
    pub parent: Option<ContextId>,
}

impl TerminalNode {
    pub fn new(symbol: TokenRef, parent: Option<ContextId>) -> Self {
        TerminalNode { symbol, parent }
    }

    pub fn text(&self) -> &str {
        &self.symbol.text
    }
}

impl fmt::Display for TerminalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.token_type == EOF {
            f.write_str("<EOF>")
        } else {
            f.write_str(&self.symbol.text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Rule(ContextId),
    Terminal(TerminalNode),
    /// A token consumed or conjured during error recovery.
    Error(TerminalNode),
}

impl Child {
    pub fn as_rule(&self) -> Option<ContextId> {
        match self {
            Child::Rule(id) => Some(*id),
            _ => None,
        }
    }

    /// Terminal payload of a terminal or error node.
    pub fn as_terminal(&self) -> Option<&TerminalNode> {
        match self {
            Child::Terminal(node) | Child::Error(node) => Some(node),
            Child::Rule(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Child::Error(_))
    }
}

/// One rule invocation; once linked into its parent's children it is also a
/// parse-tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserRuleContext {
    id: ContextId,
    pub parent: Option<ContextId>,
    /// Automaton state of the call site; `-1` for the root.
    pub invoking_state: i32,
    pub rule_index: usize,
    /// Outer alternative chosen for this invocation; 0 until known.
    pub alt_number: usize,
    /// Label of the alternative-specific context type, if the rule was
    /// re-typed after entry.
    pub label: Option<&'static str>,
    pub start: Option<TokenRef>,
    pub stop: Option<TokenRef>,
    pub(crate) children: Option<Vec<Child>>,
    pub exception: Option<Arc<RecognitionError>>,
}

impl ParserRuleContext {
    pub(crate) fn new(id: ContextId, parent: Option<ContextId>, invoking_state: i32, rule_index: usize) -> Self {
        ParserRuleContext {
            id,
            parent,
            invoking_state,
            rule_index,
            alt_number: 0,
            label: None,
            start: None,
            stop: None,
            children: None,
            exception: None,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.invoking_state == -1
    }

    /// `None` when tree building never attached anything to this context.
    pub fn children(&self) -> Option<&[Child]> {
        self.children.as_deref()
    }

    pub fn child(&self, i: usize) -> Option<&Child> {
        self.children.as_ref().and_then(|c| c.get(i))
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }

    pub(crate) fn push_child(&mut self, child: Child) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }
}
