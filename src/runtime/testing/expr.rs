//! A two-rule expression grammar:
//!
//! ```text
//! prog : expr EOF ;
//! expr : expr '+' expr | INT ;   // left-recursive, '+' is left-associative
//! ```
//!
//! After left-recursion elimination `expr` reads
//! `expr[p] : INT ({2 >= p}? '+' expr[3])* ;`. The rule functions below are
//! written the way a code generator emits them against [`Parser`].

use std::sync::Arc;

use logos::Logos;
use once_cell::sync::Lazy;

use crate::runtime::atn::{Atn, AtnError, StateType, Transition};
use crate::runtime::error::{ParseError, RecognitionError};
use crate::runtime::parser::{GrammarInfo, Parser};
use crate::runtime::token::{CommonTokenStream, ListTokenSource, LogosTokenSource, TokenSource, Vocabulary, EOF};
use crate::runtime::tree::ContextId;

use super::builder::AtnBuilder;

pub const INT: i32 = 1;
pub const PLUS: i32 = 2;

pub const RULE_PROG: usize = 0;
pub const RULE_EXPR: usize = 1;

pub const RULE_NAMES: [&str; 2] = ["prog", "expr"];
pub const LITERAL_NAMES: [Option<&str>; 3] = [None, None, Some("'+'")];
pub const SYMBOLIC_NAMES: [Option<&str>; 3] = [None, Some("INT"), Some("PLUS")];

/// Star loop after the left operand: continue with `'+' expr` or leave.
pub const DECISION_LOOP: usize = 0;

/// State numbers of the automaton.
pub mod states {
    use crate::runtime::atn::StateId;

    pub const PROG_START: StateId = 0;
    pub const PROG_STOP: StateId = 1;
    pub const PROG_CALL_EXPR: StateId = 2;
    pub const PROG_EOF: StateId = 3;
    pub const EXPR_START: StateId = 5;
    pub const EXPR_STOP: StateId = 6;
    pub const EXPR_INT: StateId = 7;
    pub const EXPR_LOOP_ENTRY: StateId = 9;
    pub const EXPR_BLOCK: StateId = 10;
    pub const EXPR_PRED: StateId = 11;
    pub const EXPR_PLUS: StateId = 12;
    pub const EXPR_CALL_EXPR: StateId = 13;
    pub const EXPR_LOOP_END: StateId = 17;
}

fn build() -> Result<Atn, AtnError> {
    let mut b = AtnBuilder::parser(PLUS);

    let prog_start = b.rule_start(RULE_PROG, false);
    let prog_stop = b.rule_stop(RULE_PROG);
    let call = b.basic(RULE_PROG);
    let eof = b.basic(RULE_PROG);
    let prog_end = b.basic(RULE_PROG);

    let expr_start = b.rule_start(RULE_EXPR, true);
    let expr_stop = b.rule_stop(RULE_EXPR);
    let int = b.basic(RULE_EXPR);
    let after_int = b.basic(RULE_EXPR);
    let entry = b.state(RULE_EXPR, StateType::StarLoopEntry);
    let block = b.state(RULE_EXPR, StateType::StarBlockStart);
    let pred = b.basic(RULE_EXPR);
    let plus = b.basic(RULE_EXPR);
    let call_expr = b.basic(RULE_EXPR);
    let follow = b.basic(RULE_EXPR);
    let block_end = b.state(RULE_EXPR, StateType::BlockEnd);
    let loop_back = b.state(RULE_EXPR, StateType::StarLoopBack);
    let loop_end = b.state(RULE_EXPR, StateType::LoopEnd);

    b.block_end(block, block_end)
        .loop_end(loop_end, loop_back)
        .epsilon(prog_start, call)
        .edge(call, Transition::rule(expr_start, RULE_EXPR, 0, eof))
        .edge(eof, Transition::atom(prog_end, EOF))
        .epsilon(prog_end, prog_stop)
        .epsilon(expr_start, int)
        .edge(int, Transition::atom(after_int, INT))
        .epsilon(after_int, entry)
        .epsilon(entry, block)
        .epsilon(entry, loop_end)
        .epsilon(block, pred)
        .edge(pred, Transition::precedence(plus, 2))
        .edge(plus, Transition::atom(call_expr, PLUS))
        .edge(call_expr, Transition::rule(expr_start, RULE_EXPR, 3, follow))
        .epsilon(follow, block_end)
        .epsilon(block_end, loop_back)
        .epsilon(loop_back, entry)
        .epsilon(loop_end, expr_stop)
        .decision(entry)
        .decision(block);
    b.build()
}

pub static ATN: Lazy<Atn> = Lazy::new(|| build().expect("sample automaton is well formed"));

static GRAMMAR: Lazy<Arc<GrammarInfo>> = Lazy::new(|| {
    Arc::new(GrammarInfo::new(
        "Expr.g4",
        RULE_NAMES.iter().map(|r| r.to_string()).collect(),
        Vocabulary::from_static(&LITERAL_NAMES, &SYMBOLIC_NAMES),
        Arc::new(ATN.clone()),
    ))
});

pub fn grammar() -> Arc<GrammarInfo> {
    Arc::clone(&GRAMMAR)
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Lexeme {
    #[regex("[0-9]+")]
    Int,
    #[token("+")]
    Plus,
}

/// Tokenize `input` up front. Characters outside the grammar become
/// invalid-type tokens.
pub fn tokens(input: &str) -> CommonTokenStream<ListTokenSource> {
    let mut source = LogosTokenSource::new(input, |lexeme: &Lexeme| {
        Some(match lexeme {
            Lexeme::Int => INT,
            Lexeme::Plus => PLUS,
        })
    });
    let mut tokens = Vec::new();
    loop {
        let token = source.next_token();
        let done = token.is_eof();
        tokens.push(token);
        if done {
            break;
        }
    }
    CommonTokenStream::new(ListTokenSource::new(tokens))
}

pub fn parser(input: &str) -> Parser {
    Parser::new(grammar(), tokens(input))
}

/// `prog : expr EOF ;`
pub fn prog(p: &mut Parser) -> Result<ContextId, ParseError> {
    let localctx = p.create_context(p.context(), p.state(), RULE_PROG);
    p.enter_rule(localctx, states::PROG_START as i32, RULE_PROG);
    let outcome = match prog_alt(p, localctx) {
        Ok(()) => Ok(()),
        Err(e) => p.handle_rule_error(localctx, e),
    };
    p.exit_rule();
    outcome.map(|()| localctx)
}

fn prog_alt(p: &mut Parser, localctx: ContextId) -> Result<(), ParseError> {
    p.enter_outer_alt(localctx, 1);
    p.set_state(states::PROG_CALL_EXPR as i32);
    expr(p, 0)?;
    p.set_state(states::PROG_EOF as i32);
    p.match_token(EOF)?;
    Ok(())
}

/// `expr[p] : INT ({2 >= p}? '+' expr[3])* ;`
pub fn expr(p: &mut Parser, precedence: i32) -> Result<ContextId, ParseError> {
    let parentctx = p.context();
    let parent_state = p.state();
    let mut localctx = p.create_context(parentctx, parent_state, RULE_EXPR);
    p.enter_recursion_rule(localctx, states::EXPR_START as i32, RULE_EXPR, precedence);
    let outcome = match expr_alt(p, &mut localctx, parentctx, parent_state) {
        Ok(()) => Ok(()),
        Err(e) => p.handle_rule_error(localctx, e),
    };
    p.unroll_recursion_contexts(parentctx);
    outcome.map(|()| localctx)
}

fn expr_alt(
    p: &mut Parser,
    localctx: &mut ContextId,
    parentctx: Option<ContextId>,
    parent_state: i32,
) -> Result<(), ParseError> {
    p.enter_outer_alt(*localctx, 1);
    p.set_state(states::EXPR_INT as i32);
    p.match_token(INT)?;
    let stop = p.input_mut().lt(-1);
    p.tree_mut()[*localctx].stop = stop;

    p.set_state(states::EXPR_LOOP_ENTRY as i32);
    p.sync()?;
    let mut alt = p.adaptive_predict(DECISION_LOOP)?;
    while alt != 2 {
        if alt == 1 {
            if !p.parse_listeners().is_empty() {
                p.trigger_exit_rule_event();
            }
            *localctx = p.create_context(parentctx, parent_state, RULE_EXPR);
            p.push_new_recursion_context(*localctx, states::EXPR_START as i32, RULE_EXPR);
            p.set_state(states::EXPR_PRED as i32);
            if !p.precpred(*localctx, 2) {
                let error = RecognitionError::failed_predicate(p, Some("precpred(_ctx, 2)"), None);
                return Err(ParseError::recognition(error));
            }
            p.set_state(states::EXPR_PLUS as i32);
            p.match_token(PLUS)?;
            p.set_state(states::EXPR_CALL_EXPR as i32);
            expr(p, 3)?;
        }
        p.set_state(states::EXPR_LOOP_ENTRY as i32);
        p.sync()?;
        alt = p.adaptive_predict(DECISION_LOOP)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_constants_name_the_right_states() {
        let kind = |s| ATN.state(s).unwrap().state_type();
        assert_eq!(kind(states::PROG_START), StateType::RuleStart);
        assert_eq!(kind(states::EXPR_STOP), StateType::RuleStop);
        assert_eq!(kind(states::EXPR_LOOP_ENTRY), StateType::StarLoopEntry);
        assert_eq!(kind(states::EXPR_BLOCK), StateType::StarBlockStart);
        assert_eq!(kind(states::EXPR_LOOP_END), StateType::LoopEnd);
        assert_eq!(ATN.rule_start_state(RULE_EXPR), Some(states::EXPR_START));
        assert_eq!(ATN.rule_stop_state(RULE_PROG), Some(states::PROG_STOP));
        assert_eq!(ATN.decision_state(DECISION_LOOP).unwrap().state_number, states::EXPR_LOOP_ENTRY);
        assert!(ATN.is_left_recursive(RULE_EXPR));
    }

    #[test]
    fn lexes_ints_and_plus() {
        use crate::runtime::token::TokenStream;
        let mut stream = tokens("12 + 3");
        assert_eq!(stream.la(1), INT);
        assert_eq!(stream.la(2), PLUS);
        assert_eq!(stream.la(3), INT);
        assert_eq!(stream.la(4), EOF);
    }

    #[test]
    fn plus_is_left_associative() {
        let mut p = parser("1+2+3");
        let root = prog(&mut p).unwrap();
        assert_eq!(
            p.tree().to_string_tree(root, &RULE_NAMES),
            "(prog (expr (expr (expr 1) + (expr 2)) + (expr 3)) <EOF>)"
        );
    }
}
