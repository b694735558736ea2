//! Parse listeners and the tree walker.

use super::arena::ParseTree;
use super::context::{Child, ContextId, TerminalNode};

/// Callbacks fired while a parse runs (when registered on the parser) or
/// while a finished tree is walked.
///
/// `enter_rule`/`exit_rule` are the per-node hooks a generated listener
/// dispatches on `tree[ctx].rule_index`. The engine calls them right after
/// `enter_every_rule` and right before `exit_every_rule`.
pub trait ParseTreeListener {
    fn visit_terminal(&mut self, _node: &TerminalNode) {}

    fn visit_error_node(&mut self, _node: &TerminalNode) {}

    fn enter_every_rule(&mut self, _tree: &ParseTree, _ctx: ContextId) {}

    fn exit_every_rule(&mut self, _tree: &ParseTree, _ctx: ContextId) {}

    fn enter_rule(&mut self, _tree: &ParseTree, _ctx: ContextId) {}

    fn exit_rule(&mut self, _tree: &ParseTree, _ctx: ContextId) {}
}

/// Depth-first walk of a finished tree.
pub struct ParseTreeWalker;

impl ParseTreeWalker {
    pub fn walk(listener: &mut dyn ParseTreeListener, tree: &ParseTree, root: ContextId) {
        listener.enter_every_rule(tree, root);
        listener.enter_rule(tree, root);
        for child in tree[root].children().unwrap_or_default() {
            match child {
                Child::Rule(c) => Self::walk(listener, tree, *c),
                Child::Terminal(node) => listener.visit_terminal(node),
                Child::Error(node) => listener.visit_error_node(node),
            }
        }
        listener.exit_rule(tree, root);
        listener.exit_every_rule(tree, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::token::Token;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl ParseTreeListener for Recorder {
        fn visit_terminal(&mut self, node: &TerminalNode) {
            self.0.push(format!("t:{node}"));
        }
        fn visit_error_node(&mut self, node: &TerminalNode) {
            self.0.push(format!("err:{node}"));
        }
        fn enter_every_rule(&mut self, tree: &ParseTree, ctx: ContextId) {
            self.0.push(format!("enter:{}", tree[ctx].rule_index));
        }
        fn exit_every_rule(&mut self, tree: &ParseTree, ctx: ContextId) {
            self.0.push(format!("exit:{}", tree[ctx].rule_index));
        }
    }

    #[test]
    fn walk_visits_in_document_order() {
        let mut tree = ParseTree::new();
        let root = tree.create(None, -1, 0);
        let inner = tree.create(Some(root), 2, 1);
        tree.add_terminal(root, Arc::new(Token::new(3, "x")));
        tree.add_child(root, inner);
        tree.add_error_node(inner, Arc::new(Token::new(4, "y")));

        let mut recorder = Recorder::default();
        ParseTreeWalker::walk(&mut recorder, &tree, root);
        assert_eq!(
            recorder.0,
            vec!["enter:0", "t:x", "enter:1", "err:y", "exit:1", "exit:0"]
        );
    }
}
