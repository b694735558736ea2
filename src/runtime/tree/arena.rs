//! The context arena.
//!
//! Every rule context a parse creates lives here, addressed by [`ContextId`].
//! A parent owns its children list; a context's `parent` field is only a
//! back-reference for walking upwards. Relinking (re-typing a context,
//! folding left-recursive invocations) is done through the explicit
//! operations below.

use std::ops::{Index, IndexMut};

use crate::runtime::misc::Interval;
use crate::runtime::token::TokenRef;

use super::context::{Child, ContextId, ParserRuleContext, TerminalNode};

#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    contexts: Vec<ParserRuleContext>,
}

impl Index<ContextId> for ParseTree {
    type Output = ParserRuleContext;

    fn index(&self, id: ContextId) -> &ParserRuleContext {
        &self.contexts[id.0]
    }
}

impl IndexMut<ContextId> for ParseTree {
    fn index_mut(&mut self, id: ContextId) -> &mut ParserRuleContext {
        &mut self.contexts[id.0]
    }
}

impl ParseTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<ContextId>, invoking_state: i32, rule_index: usize) -> ContextId {
        let id = ContextId(self.contexts.len());
        self.contexts
            .push(ParserRuleContext::new(id, parent, invoking_state, rule_index));
        id
    }

    pub fn get(&self, id: ContextId) -> Option<&ParserRuleContext> {
        self.contexts.get(id.0)
    }

    pub fn get_mut(&mut self, id: ContextId) -> Option<&mut ParserRuleContext> {
        self.contexts.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn clear(&mut self) {
        self.contexts.clear();
    }

    // ==== linking ====

    pub fn add_child(&mut self, parent: ContextId, child: ContextId) {
        self[parent].push_child(Child::Rule(child));
    }

    pub fn add_terminal(&mut self, parent: ContextId, symbol: TokenRef) {
        self[parent].push_child(Child::Terminal(TerminalNode::new(symbol, Some(parent))));
    }

    pub fn add_error_node(&mut self, parent: ContextId, symbol: TokenRef) {
        self[parent].push_child(Child::Error(TerminalNode::new(symbol, Some(parent))));
    }

    pub fn remove_last_child(&mut self, parent: ContextId) -> Option<Child> {
        self[parent].children.as_mut().and_then(Vec::pop)
    }

    /// Take over `source`'s place: parent, invoking state, start and stop,
    /// plus its error-node children (re-parented onto `target`). Ordinary
    /// children are not copied.
    pub fn copy_from(&mut self, target: ContextId, source: ContextId) {
        let src = &self[source];
        let parent = src.parent;
        let invoking_state = src.invoking_state;
        let start = src.start.clone();
        let stop = src.stop.clone();
        let errors = src.children.as_ref().map(|children| {
            children
                .iter()
                .filter_map(|child| match child {
                    Child::Error(node) => Some(Child::Error(TerminalNode::new(node.symbol.clone(), Some(target)))),
                    _ => None,
                })
                .collect::<Vec<_>>()
        });
        let dst = &mut self[target];
        dst.parent = parent;
        dst.invoking_state = invoking_state;
        dst.start = start;
        dst.stop = stop;
        if let Some(errors) = errors {
            dst.children = Some(errors);
        }
    }

    pub(crate) fn trim(&mut self, id: ContextId) {
        if let Some(children) = self[id].children.as_mut() {
            children.shrink_to_fit();
        }
    }

    // ==== queries ====

    pub fn child(&self, id: ContextId, i: usize) -> Option<&Child> {
        self.get(id)?.child(i)
    }

    pub fn child_count(&self, id: ContextId) -> usize {
        self.get(id).map_or(0, ParserRuleContext::child_count)
    }

    /// Inclusive token-index range covered by a context. A context that
    /// consumed nothing yields `(start, start - 1)`.
    pub fn source_interval(&self, id: ContextId) -> Interval {
        let ctx = &self[id];
        let Some(start) = &ctx.start else {
            return Interval::INVALID;
        };
        match &ctx.stop {
            Some(stop) if stop.token_index >= start.token_index => {
                Interval::new(start.token_index, stop.token_index)
            }
            _ => Interval::new(start.token_index, start.token_index - 1),
        }
    }

    /// The context and its ancestors, innermost first.
    pub fn parents(&self, id: ContextId) -> impl Iterator<Item = ContextId> + '_ {
        std::iter::successors(Some(id), move |&c| self.get(c).and_then(|ctx| ctx.parent))
    }

    /// Number of contexts from `id` up to the root, inclusive.
    pub fn depth(&self, id: ContextId) -> usize {
        self.parents(id).count()
    }

    /// Ancestors of `id`, root first, excluding `id` itself.
    pub fn ancestors(&self, id: ContextId) -> Vec<ContextId> {
        let mut ancestors: Vec<_> = self.parents(id).skip(1).collect();
        ancestors.reverse();
        ancestors
    }

    pub fn is_ancestor_of(&self, ancestor: ContextId, id: ContextId) -> bool {
        self.parents(id).skip(1).any(|c| c == ancestor)
    }

    /// Concatenated token text of the subtree, without separators.
    pub fn text(&self, id: ContextId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ContextId, out: &mut String) {
        for child in self[id].children().unwrap_or_default() {
            match child {
                Child::Rule(c) => self.collect_text(*c, out),
                Child::Terminal(node) | Child::Error(node) => out.push_str(node.text()),
            }
        }
    }

    /// The `i`th terminal child (error nodes included) with token type `ttype`.
    pub fn token(&self, id: ContextId, ttype: i32, i: usize) -> Option<&TerminalNode> {
        self.tokens(id, ttype).into_iter().nth(i)
    }

    pub fn tokens(&self, id: ContextId, ttype: i32) -> Vec<&TerminalNode> {
        self[id]
            .children()
            .unwrap_or_default()
            .iter()
            .filter_map(Child::as_terminal)
            .filter(|node| node.symbol.token_type == ttype)
            .collect()
    }

    /// Direct child contexts invoking `rule_index`.
    pub fn rule_contexts(&self, id: ContextId, rule_index: usize) -> Vec<ContextId> {
        self[id]
            .children()
            .unwrap_or_default()
            .iter()
            .filter_map(Child::as_rule)
            .filter(|&c| self[c].rule_index == rule_index)
            .collect()
    }

    pub fn rule_context(&self, id: ContextId, rule_index: usize, i: usize) -> Option<ContextId> {
        self.rule_contexts(id, rule_index).into_iter().nth(i)
    }

    /// All contexts of the subtree in pre-order, starting with `id`.
    pub fn descendants(&self, id: ContextId) -> Vec<ContextId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            out.push(c);
            let children = self[c].children().unwrap_or_default();
            stack.extend(children.iter().rev().filter_map(Child::as_rule));
        }
        out
    }

    // ==== printing ====

    /// LISP-style rendering: `(rule child child ...)`, whitespace escaped.
    pub fn to_string_tree<S: AsRef<str>>(&self, id: ContextId, rule_names: &[S]) -> String {
        let mut out = String::new();
        self.write_tree(id, rule_names, false, &mut out);
        out
    }

    /// Like [`Self::to_string_tree`], labelling rule nodes `rule:alt` once an
    /// outer alternative has been recorded.
    pub fn to_string_tree_with_alts<S: AsRef<str>>(&self, id: ContextId, rule_names: &[S]) -> String {
        let mut out = String::new();
        self.write_tree(id, rule_names, true, &mut out);
        out
    }

    fn write_tree<S: AsRef<str>>(&self, id: ContextId, rule_names: &[S], alts: bool, out: &mut String) {
        let ctx = &self[id];
        let mut name = rule_names
            .get(ctx.rule_index)
            .map_or_else(|| ctx.rule_index.to_string(), |n| n.as_ref().to_string());
        if alts && ctx.alt_number != 0 {
            name = format!("{name}:{}", ctx.alt_number);
        }
        let children = ctx.children().unwrap_or_default();
        if children.is_empty() {
            out.push_str(&escape_whitespace(&name));
            return;
        }
        out.push('(');
        out.push_str(&escape_whitespace(&name));
        for child in children {
            out.push(' ');
            match child {
                Child::Rule(c) => self.write_tree(*c, rule_names, alts, out),
                Child::Terminal(node) | Child::Error(node) => {
                    out.push_str(&escape_whitespace(&node.to_string()))
                }
            }
        }
        out.push(')');
    }
}

pub(crate) fn escape_whitespace(s: &str) -> String {
    s.replace('\t', "\\t").replace('\n', "\\n").replace('\r', "\\r")
}
