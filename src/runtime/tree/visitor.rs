//! Result-producing tree visitors.

use super::arena::ParseTree;
use super::context::{Child, ContextId, TerminalNode};

/// A visitor computing one `Output` per node.
///
/// The default `visit_rule` folds the children's results with
/// [`aggregate_result`](Self::aggregate_result), starting from
/// [`default_result`](Self::default_result).
pub trait ParseTreeVisitor {
    type Output;

    fn default_result(&mut self) -> Self::Output;

    fn aggregate_result(&mut self, _aggregate: Self::Output, next: Self::Output) -> Self::Output {
        next
    }

    /// Checked before each child; returning false stops the fold early.
    fn should_visit_next_child(&mut self, _tree: &ParseTree, _ctx: ContextId, _current: &Self::Output) -> bool {
        true
    }

    fn visit_rule(&mut self, tree: &ParseTree, ctx: ContextId) -> Self::Output {
        self.visit_children(tree, ctx)
    }

    fn visit_terminal(&mut self, _node: &TerminalNode) -> Self::Output {
        self.default_result()
    }

    fn visit_error_node(&mut self, _node: &TerminalNode) -> Self::Output {
        self.default_result()
    }

    fn visit_children(&mut self, tree: &ParseTree, ctx: ContextId) -> Self::Output {
        let mut result = self.default_result();
        for child in tree[ctx].children().unwrap_or_default() {
            if !self.should_visit_next_child(tree, ctx, &result) {
                break;
            }
            let child_result = child.accept(self, tree);
            result = self.aggregate_result(result, child_result);
        }
        result
    }
}

impl Child {
    /// Double dispatch into the visitor method matching this node.
    pub fn accept<V: ParseTreeVisitor + ?Sized>(&self, visitor: &mut V, tree: &ParseTree) -> V::Output {
        match self {
            Child::Rule(ctx) => visitor.visit_rule(tree, *ctx),
            Child::Terminal(node) => visitor.visit_terminal(node),
            Child::Error(node) => visitor.visit_error_node(node),
        }
    }
}
