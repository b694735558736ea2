//! The parser state machine generated rule functions call into.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;

use crate::runtime::atn::{Atn, AtnError, StateId};
use crate::runtime::error::{
    BailErrorStrategy, ErrorListener, ErrorStrategy, ParseError, RecognitionError, TracingErrorListener,
};
use crate::runtime::misc::IntervalSet;
use crate::runtime::token::{Token, TokenRef, TokenStream, Vocabulary, EOF, EPSILON};
use crate::runtime::tree::{ContextId, ParseTree, ParseTreeListener, TerminalNode};

use super::grammar::GrammarInfo;
use super::interpreter::{DecisionContext, DecisionInterpreter, LookaheadInterpreter};
use super::options::ParserOptions;

/// A running parse over one token stream.
///
/// Contexts are allocated in the parser's [`ParseTree`] and stay there until
/// [`Parser::reset`]. The active chain runs from [`Parser::context`] up
/// through `parent` links to the start rule's context.
pub struct Parser {
    grammar: Arc<GrammarInfo>,
    input: Box<dyn TokenStream>,
    tree: ParseTree,
    ctx: Option<ContextId>,
    state: i32,
    precedence_stack: Vec<i32>,
    error_handler: Rc<dyn ErrorStrategy>,
    interpreter: Box<dyn DecisionInterpreter>,
    listeners: Vec<Rc<RefCell<dyn ParseTreeListener>>>,
    error_listeners: Vec<Rc<RefCell<dyn ErrorListener>>>,
    build_parse_trees: bool,
    trim_parse_tree: bool,
    trace: bool,
    syntax_errors: usize,
    matched_eof: bool,
}

impl Parser {
    pub fn new(grammar: Arc<GrammarInfo>, input: impl TokenStream + 'static) -> Self {
        Self::with_options(grammar, input, ParserOptions::default())
    }

    /// Contexts live in the parser's arena whether or not trees are built.
    /// With `build_parse_trees` off nothing links them into a tree, but the
    /// arena still keeps every context of the parse until [`Self::reset`].
    pub fn with_options(grammar: Arc<GrammarInfo>, input: impl TokenStream + 'static, options: ParserOptions) -> Self {
        Parser {
            grammar,
            input: Box::new(input),
            tree: ParseTree::new(),
            ctx: None,
            state: -1,
            precedence_stack: vec![0],
            error_handler: Rc::new(BailErrorStrategy::new()),
            interpreter: Box::new(LookaheadInterpreter),
            listeners: Vec::new(),
            error_listeners: vec![Rc::new(RefCell::new(TracingErrorListener))],
            build_parse_trees: options.build_parse_trees,
            trim_parse_tree: options.trim_parse_trees,
            trace: options.trace,
            syntax_errors: 0,
            matched_eof: false,
        }
    }

    /// Return the parser to its initial state over the same input: rewind
    /// the stream, drop every context and clear the error count.
    pub fn reset(&mut self) {
        self.input.seek(0);
        let handler = Rc::clone(&self.error_handler);
        handler.reset(self);
        self.interpreter.reset();
        self.ctx = None;
        self.state = -1;
        self.syntax_errors = 0;
        self.matched_eof = false;
        self.trace = false;
        self.precedence_stack.clear();
        self.precedence_stack.push(0);
        self.tree.clear();
    }

    /// Swap the input and reset.
    pub fn set_token_stream(&mut self, input: impl TokenStream + 'static) {
        self.input = Box::new(input);
        self.reset();
    }

    // ==== accessors ====

    pub fn grammar(&self) -> &Arc<GrammarInfo> {
        &self.grammar
    }

    pub fn atn(&self) -> &Atn {
        &self.grammar.atn
    }

    pub fn rule_names(&self) -> &[String] {
        &self.grammar.rule_names
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.grammar.vocabulary
    }

    pub fn input_mut(&mut self) -> &mut dyn TokenStream {
        self.input.as_mut()
    }

    pub fn source_name(&self) -> String {
        self.input.source_name()
    }

    pub fn tree(&self) -> &ParseTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ParseTree {
        &mut self.tree
    }

    /// Hand the tree over to the caller, leaving an empty one behind.
    pub fn take_tree(&mut self) -> ParseTree {
        self.ctx = None;
        std::mem::take(&mut self.tree)
    }

    pub fn context(&self) -> Option<ContextId> {
        self.ctx
    }

    pub fn set_context(&mut self, ctx: Option<ContextId>) {
        self.ctx = ctx;
    }

    pub fn state(&self) -> i32 {
        self.state
    }

    pub fn set_state(&mut self, state: i32) {
        self.state = state;
    }

    /// Allocate a context for a rule about to be entered.
    pub fn create_context(&mut self, parent: Option<ContextId>, invoking_state: i32, rule_index: usize) -> ContextId {
        self.tree.create(parent, invoking_state, rule_index)
    }

    pub fn error_handler(&self) -> Rc<dyn ErrorStrategy> {
        Rc::clone(&self.error_handler)
    }

    pub fn set_error_handler(&mut self, handler: Rc<dyn ErrorStrategy>) {
        self.error_handler = handler;
    }

    pub fn set_interpreter(&mut self, interpreter: Box<dyn DecisionInterpreter>) {
        self.interpreter = interpreter;
    }

    pub fn build_parse_tree(&self) -> bool {
        self.build_parse_trees
    }

    pub fn set_build_parse_tree(&mut self, build: bool) {
        self.build_parse_trees = build;
    }

    pub fn trim_parse_tree(&self) -> bool {
        self.trim_parse_tree
    }

    pub fn set_trim_parse_tree(&mut self, trim: bool) {
        self.trim_parse_tree = trim;
    }

    pub fn is_trace(&self) -> bool {
        self.trace
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn number_of_syntax_errors(&self) -> usize {
        self.syntax_errors
    }

    pub fn is_matched_eof(&self) -> bool {
        self.matched_eof
    }

    // ==== listeners ====

    pub fn add_parse_listener(&mut self, listener: Rc<RefCell<dyn ParseTreeListener>>) {
        self.listeners.push(listener);
    }

    pub fn remove_parse_listener(&mut self, listener: &Rc<RefCell<dyn ParseTreeListener>>) {
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn remove_parse_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn parse_listeners(&self) -> &[Rc<RefCell<dyn ParseTreeListener>>] {
        &self.listeners
    }

    pub fn add_error_listener(&mut self, listener: Rc<RefCell<dyn ErrorListener>>) {
        self.error_listeners.push(listener);
    }

    pub fn remove_error_listener(&mut self, listener: &Rc<RefCell<dyn ErrorListener>>) {
        self.error_listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn remove_error_listeners(&mut self) {
        self.error_listeners.clear();
    }

    /// Count a syntax error and pass it to every error listener.
    pub fn notify_error_listeners(&mut self, offending: Option<&Token>, msg: &str, error: Option<&RecognitionError>) {
        self.syntax_errors += 1;
        let (line, column) = offending.map_or((0, 0), |t| (t.line, t.column));
        for listener in &self.error_listeners {
            listener
                .borrow_mut()
                .syntax_error(offending, line, column, msg, error);
        }
    }

    /// Report `msg` against the current token.
    pub fn notify_error(&mut self, msg: &str) {
        let token = self.current_token();
        self.notify_error_listeners(Some(&token), msg, None);
    }

    fn observing(&self) -> bool {
        !self.listeners.is_empty() || self.trace || self.trim_parse_tree
    }

    fn rule_name(&self, ctx: ContextId) -> &str {
        self.grammar
            .rule_names
            .get(self.tree[ctx].rule_index)
            .map_or("<unknown>", String::as_str)
    }

    fn trigger_enter_rule_event(&mut self) {
        let Some(ctx) = self.ctx else {
            return;
        };
        if self.trace {
            let lt1 = self.current_token();
            trace!(rule = self.rule_name(ctx), lt1 = %lt1.text, "enter");
        }
        for listener in &self.listeners {
            let mut listener = listener.borrow_mut();
            listener.enter_every_rule(&self.tree, ctx);
            listener.enter_rule(&self.tree, ctx);
        }
    }

    /// Fire exit callbacks for the current context, innermost listener
    /// first. Generated code for left-recursive rules calls this before it
    /// folds the current context into a new one.
    pub fn trigger_exit_rule_event(&mut self) {
        let Some(ctx) = self.ctx else {
            return;
        };
        for listener in self.listeners.iter().rev() {
            let mut listener = listener.borrow_mut();
            listener.exit_rule(&self.tree, ctx);
            listener.exit_every_rule(&self.tree, ctx);
        }
        if self.trim_parse_tree {
            self.tree.trim(ctx);
        }
        if self.trace {
            let lt1 = self.current_token();
            trace!(rule = self.rule_name(ctx), lt1 = %lt1.text, "exit");
        }
    }

    // ==== tokens ====

    /// `LT(1)`; a synthetic EOF token when the stream yields nothing.
    pub fn current_token(&mut self) -> TokenRef {
        self.input.lt(1).unwrap_or_else(|| Arc::new(Token::eof()))
    }

    /// Match the current token against `ttype` and consume it.
    ///
    /// On a mismatch the error strategy decides: it either supplies a token
    /// (recorded as an error node when it was conjured) or fails.
    pub fn match_token(&mut self, ttype: i32) -> Result<TokenRef, ParseError> {
        let t = self.current_token();
        if t.token_type == ttype {
            if ttype == EOF {
                self.matched_eof = true;
            }
            let handler = Rc::clone(&self.error_handler);
            handler.report_match(self);
            self.consume();
            return Ok(t);
        }
        self.recover_inline()
    }

    /// Match any token except EOF.
    pub fn match_wildcard(&mut self) -> Result<TokenRef, ParseError> {
        let t = self.current_token();
        if t.token_type > 0 {
            let handler = Rc::clone(&self.error_handler);
            handler.report_match(self);
            self.consume();
            return Ok(t);
        }
        self.recover_inline()
    }

    /// Hand a token that fits nothing expected here to the error strategy.
    /// Generated code calls this directly after an inline set test fails.
    pub fn recover_inline(&mut self) -> Result<TokenRef, ParseError> {
        let handler = Rc::clone(&self.error_handler);
        let t = handler.recover_inline(self)?;
        if self.build_parse_trees && t.token_index == -1 {
            if let Some(ctx) = self.ctx {
                self.tree.add_error_node(ctx, Arc::clone(&t));
            }
        }
        Ok(t)
    }

    /// Consume the current token and return it. EOF is never consumed.
    ///
    /// The token becomes a terminal child of the current context, or an
    /// error node while the strategy is recovering, and is passed to the
    /// parse listeners.
    pub fn consume(&mut self) -> TokenRef {
        let o = self.current_token();
        if o.token_type != EOF {
            self.input.consume();
        }
        let Some(ctx) = self.ctx else {
            return o;
        };
        if self.trace {
            trace!(token = %o.text, rule = self.rule_name(ctx), "consume");
        }
        if !self.build_parse_trees && self.listeners.is_empty() {
            return o;
        }
        let handler = Rc::clone(&self.error_handler);
        let node = TerminalNode::new(Arc::clone(&o), Some(ctx));
        if handler.in_error_recovery_mode(self) {
            if self.build_parse_trees {
                self.tree.add_error_node(ctx, Arc::clone(&o));
            }
            for listener in &self.listeners {
                listener.borrow_mut().visit_error_node(&node);
            }
        } else {
            if self.build_parse_trees {
                self.tree.add_terminal(ctx, Arc::clone(&o));
            }
            for listener in &self.listeners {
                listener.borrow_mut().visit_terminal(&node);
            }
        }
        o
    }

    // ==== rule invocation ====

    /// Make `localctx` current. Its parent must already be the current
    /// context (or `None` for the start rule).
    pub fn enter_rule(&mut self, localctx: ContextId, state: i32, _rule_index: usize) {
        self.state = state;
        self.ctx = Some(localctx);
        let start = self.current_token();
        self.tree[localctx].start = Some(start);
        if self.build_parse_trees {
            if let Some(parent) = self.tree[localctx].parent {
                self.tree.add_child(parent, localctx);
            }
        }
        self.trigger_enter_rule_event();
    }

    /// Close the current context and return to its parent.
    pub fn exit_rule(&mut self) {
        let Some(ctx) = self.ctx else {
            return;
        };
        let stop = if self.matched_eof {
            Some(self.current_token())
        } else {
            self.input.lt(-1)
        };
        self.tree[ctx].stop = stop;
        self.trigger_exit_rule_event();
        self.state = self.tree[ctx].invoking_state;
        self.ctx = self.tree[ctx].parent;
    }

    /// Record the chosen outer alternative. When `localctx` replaces the
    /// context that was entered (alternative-labelled rules), it also takes
    /// that context's place in the parent's children.
    pub fn enter_outer_alt(&mut self, localctx: ContextId, alt: usize) {
        self.tree[localctx].alt_number = alt;
        if self.build_parse_trees && self.ctx != Some(localctx) {
            if let Some(parent) = self.ctx.and_then(|c| self.tree[c].parent) {
                self.tree.remove_last_child(parent);
                self.tree.add_child(parent, localctx);
            }
        }
        self.ctx = Some(localctx);
    }

    /// Top of the precedence stack, or `-1` when it is empty.
    pub fn precedence(&self) -> i32 {
        self.precedence_stack.last().copied().unwrap_or(-1)
    }

    /// Enter a left-recursive rule invoked with `precedence`.
    ///
    /// Unlike [`Self::enter_rule`] the context is not linked into its parent
    /// here; [`Self::unroll_recursion_contexts`] does that once the final
    /// shape of the invocation is known.
    pub fn enter_recursion_rule(&mut self, localctx: ContextId, state: i32, _rule_index: usize, precedence: i32) {
        self.state = state;
        self.precedence_stack.push(precedence);
        self.ctx = Some(localctx);
        let start = self.current_token();
        self.tree[localctx].start = Some(start);
        self.trigger_enter_rule_event();
    }

    /// Fold the current context into `localctx` as its first child: the
    /// operand parsed so far becomes the left operand of a new invocation of
    /// the same rule.
    pub fn push_new_recursion_context(&mut self, localctx: ContextId, state: i32, _rule_index: usize) {
        let Some(previous) = self.ctx else {
            return;
        };
        let stop = self.input.lt(-1);
        let prev = &mut self.tree[previous];
        prev.parent = Some(localctx);
        prev.invoking_state = state;
        prev.stop = stop;
        let start = prev.start.clone();

        self.ctx = Some(localctx);
        self.tree[localctx].start = start;
        if self.build_parse_trees {
            self.tree.add_child(localctx, previous);
        }
        self.trigger_enter_rule_event();
    }

    /// Leave a left-recursive rule: pop its precedence, close the outermost
    /// folded context and link it under `parent`.
    pub fn unroll_recursion_contexts(&mut self, parent: Option<ContextId>) {
        self.precedence_stack.pop();
        let Some(retctx) = self.ctx else {
            self.ctx = parent;
            return;
        };
        self.tree[retctx].stop = self.input.lt(-1);
        if self.observing() {
            while self.ctx.is_some() && self.ctx != parent {
                self.trigger_exit_rule_event();
                self.ctx = self.ctx.and_then(|c| self.tree[c].parent);
            }
        }
        self.ctx = parent;
        self.tree[retctx].parent = parent;
        if self.build_parse_trees {
            if let Some(parent) = parent {
                self.tree.add_child(parent, retctx);
            }
        }
    }

    /// Nearest context on the active chain invoking `rule_index`.
    pub fn invoking_context(&self, rule_index: usize) -> Option<ContextId> {
        let ctx = self.ctx?;
        self.tree
            .parents(ctx)
            .find(|&c| self.tree[c].rule_index == rule_index)
    }

    /// Precedence predicate: may an operator of `precedence` continue the
    /// current left-recursive invocation?
    pub fn precpred(&self, _localctx: ContextId, precedence: i32) -> bool {
        precedence >= self.precedence()
    }

    /// Rule names of the active chain, innermost first.
    pub fn rule_invocation_stack(&self) -> Vec<String> {
        self.ctx
            .map(|ctx| self.rule_invocation_stack_of(ctx))
            .unwrap_or_default()
    }

    pub fn rule_invocation_stack_of(&self, ctx: ContextId) -> Vec<String> {
        self.tree
            .parents(ctx)
            .map(|c| {
                self.grammar
                    .rule_names
                    .get(self.tree[c].rule_index)
                    .cloned()
                    .unwrap_or_else(|| "n/a".to_string())
            })
            .collect()
    }

    // ==== expected tokens ====

    fn invoking_states(&self) -> Vec<i32> {
        self.ctx
            .map(|ctx| {
                self.tree
                    .parents(ctx)
                    .map(|c| self.tree[c].invoking_state)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn current_state(&self) -> Result<StateId, AtnError> {
        StateId::try_from(self.state).map_err(|_| AtnError::InvalidStateReference {
            index: i64::from(self.state),
        })
    }

    /// Could `symbol` be matched in the current state, following rule
    /// returns up the active chain as long as rule ends are reachable?
    pub fn is_expected_token(&self, symbol: i32) -> bool {
        let atn = self.atn();
        let Some(mut following) = self.current_state().ok().and_then(|s| atn.next_tokens(s)) else {
            return false;
        };
        if following.contains(symbol) {
            return true;
        }
        if !following.contains(EPSILON) {
            return false;
        }
        let mut ctx = self.ctx;
        while let Some(c) = ctx {
            let invoking = self.tree[c].invoking_state;
            if invoking < 0 || !following.contains(EPSILON) {
                break;
            }
            let Some(next) = atn
                .follow_state_of_invocation(invoking as StateId)
                .ok()
                .and_then(|follow| atn.next_tokens(follow))
            else {
                return false;
            };
            following = next;
            if following.contains(symbol) {
                return true;
            }
            ctx = self.tree[c].parent;
        }
        following.contains(EPSILON) && symbol == EOF
    }

    /// Every token acceptable here, through the whole active chain.
    pub fn expected_tokens(&self) -> Result<IntervalSet, AtnError> {
        self.atn()
            .expected_tokens(self.current_state()?, self.invoking_states())
    }

    /// Tokens acceptable without leaving the current rule; contains
    /// [`EPSILON`] when the rule can end here.
    pub fn expected_tokens_within_current_rule(&self) -> Result<IntervalSet, AtnError> {
        let state = self.current_state()?;
        self.atn()
            .next_tokens(state)
            .cloned()
            .ok_or(AtnError::InvalidStateReference { index: state as i64 })
    }

    // ==== decisions and errors ====

    /// Ask the decision interpreter which alternative of `decision` to take.
    pub fn adaptive_predict(&mut self, decision: usize) -> Result<usize, ParseError> {
        let precedence = self.precedence();
        let mut request = DecisionContext {
            atn: &self.grammar.atn,
            input: self.input.as_mut(),
            tree: &self.tree,
            ctx: self.ctx,
            state: self.state,
            precedence,
        };
        self.interpreter.adaptive_predict(decision, &mut request)
    }

    pub fn sync(&mut self) -> Result<(), ParseError> {
        let handler = Rc::clone(&self.error_handler);
        handler.sync(self)
    }

    /// The error handling every generated rule runs when its body fails.
    ///
    /// A syntax error is recorded on `localctx`, reported, and handed to the
    /// strategy's `recover`. Cancellations and automaton errors pass
    /// through untouched.
    pub fn handle_rule_error(&mut self, localctx: ContextId, error: ParseError) -> Result<(), ParseError> {
        match error {
            ParseError::Recognition(e) => {
                self.tree[localctx].exception = Some(Arc::clone(&e));
                let handler = Rc::clone(&self.error_handler);
                handler.report_error(self, &e);
                handler.recover(self, e)
            }
            other => Err(other),
        }
    }
}
