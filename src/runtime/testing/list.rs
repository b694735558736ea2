//! A bracketed list grammar without left recursion:
//!
//! ```text
//! list  : '[' items? ']' EOF ;
//! items : item (',' item)* ;
//! item  : INT            # number
//!       | (ID | STRING)  # name
//!       ;
//! ```
//!
//! `item` has labelled alternatives, so its rule function re-types the
//! context once the alternative is known.

use std::sync::Arc;

use logos::Logos;
use once_cell::sync::Lazy;

use crate::runtime::atn::{Atn, AtnError, StateType, Transition};
use crate::runtime::error::ParseError;
use crate::runtime::misc::IntervalSet;
use crate::runtime::parser::{GrammarInfo, Parser};
use crate::runtime::token::{CommonTokenStream, ListTokenSource, LogosTokenSource, TokenSource, Vocabulary, EOF};
use crate::runtime::tree::ContextId;

use super::builder::AtnBuilder;

pub const LBRACK: i32 = 1;
pub const RBRACK: i32 = 2;
pub const COMMA: i32 = 3;
pub const INT: i32 = 4;
pub const ID: i32 = 5;
pub const STRING: i32 = 6;

pub const RULE_LIST: usize = 0;
pub const RULE_ITEMS: usize = 1;
pub const RULE_ITEM: usize = 2;

pub const RULE_NAMES: [&str; 3] = ["list", "items", "item"];
pub const LITERAL_NAMES: [Option<&str>; 4] = [None, Some("'['"), Some("']'"), Some("','")];
pub const SYMBOLIC_NAMES: [Option<&str>; 7] = [
    None,
    Some("LBRACK"),
    Some("RBRACK"),
    Some("COMMA"),
    Some("INT"),
    Some("ID"),
    Some("STRING"),
];

pub const DECISION_OPTIONAL_ITEMS: usize = 0;
pub const DECISION_MORE_ITEMS: usize = 1;
pub const DECISION_ITEM: usize = 3;

pub mod states {
    use crate::runtime::atn::StateId;

    pub const LIST_START: StateId = 0;
    pub const LIST_LBRACK: StateId = 2;
    pub const LIST_OPTIONAL: StateId = 3;
    pub const LIST_CALL_ITEMS: StateId = 4;
    pub const LIST_RBRACK: StateId = 7;
    pub const LIST_EOF: StateId = 8;
    pub const ITEMS_START: StateId = 10;
    pub const ITEMS_CALL_ITEM: StateId = 12;
    pub const ITEMS_LOOP_ENTRY: StateId = 14;
    pub const ITEMS_COMMA: StateId = 16;
    pub const ITEMS_CALL_NEXT_ITEM: StateId = 17;
    pub const ITEM_START: StateId = 22;
    pub const ITEM_BLOCK: StateId = 24;
    pub const ITEM_INT: StateId = 25;
    pub const ITEM_NAME: StateId = 26;
}

fn build() -> Result<Atn, AtnError> {
    let mut b = AtnBuilder::parser(STRING);

    let list_start = b.rule_start(RULE_LIST, false);
    let list_stop = b.rule_stop(RULE_LIST);
    let lbrack = b.basic(RULE_LIST);
    let optional = b.state(RULE_LIST, StateType::BlockStart);
    let call_items = b.basic(RULE_LIST);
    let after_items = b.basic(RULE_LIST);
    let optional_end = b.state(RULE_LIST, StateType::BlockEnd);
    let rbrack = b.basic(RULE_LIST);
    let eof = b.basic(RULE_LIST);
    let list_end = b.basic(RULE_LIST);

    let items_start = b.rule_start(RULE_ITEMS, false);
    let items_stop = b.rule_stop(RULE_ITEMS);
    let call_item = b.basic(RULE_ITEMS);
    let after_item = b.basic(RULE_ITEMS);
    let entry = b.state(RULE_ITEMS, StateType::StarLoopEntry);
    let block = b.state(RULE_ITEMS, StateType::StarBlockStart);
    let comma = b.basic(RULE_ITEMS);
    let call_next = b.basic(RULE_ITEMS);
    let after_next = b.basic(RULE_ITEMS);
    let block_end = b.state(RULE_ITEMS, StateType::BlockEnd);
    let loop_back = b.state(RULE_ITEMS, StateType::StarLoopBack);
    let loop_end = b.state(RULE_ITEMS, StateType::LoopEnd);

    let item_start = b.rule_start(RULE_ITEM, false);
    let item_stop = b.rule_stop(RULE_ITEM);
    let alts = b.state(RULE_ITEM, StateType::BlockStart);
    let int = b.basic(RULE_ITEM);
    let name = b.basic(RULE_ITEM);
    let after_int = b.basic(RULE_ITEM);
    let after_name = b.basic(RULE_ITEM);
    let alts_end = b.state(RULE_ITEM, StateType::BlockEnd);

    b.block_end(optional, optional_end)
        .block_end(block, block_end)
        .block_end(alts, alts_end)
        .loop_end(loop_end, loop_back)
        // list
        .epsilon(list_start, lbrack)
        .edge(lbrack, Transition::atom(optional, LBRACK))
        .epsilon(optional, call_items)
        .epsilon(optional, optional_end)
        .edge(call_items, Transition::rule(items_start, RULE_ITEMS, 0, after_items))
        .epsilon(after_items, optional_end)
        .epsilon(optional_end, rbrack)
        .edge(rbrack, Transition::atom(eof, RBRACK))
        .edge(eof, Transition::atom(list_end, EOF))
        .epsilon(list_end, list_stop)
        // items
        .epsilon(items_start, call_item)
        .edge(call_item, Transition::rule(item_start, RULE_ITEM, 0, after_item))
        .epsilon(after_item, entry)
        .epsilon(entry, block)
        .epsilon(entry, loop_end)
        .epsilon(block, comma)
        .edge(comma, Transition::atom(call_next, COMMA))
        .edge(call_next, Transition::rule(item_start, RULE_ITEM, 0, after_next))
        .epsilon(after_next, block_end)
        .epsilon(block_end, loop_back)
        .epsilon(loop_back, entry)
        .epsilon(loop_end, items_stop)
        // item
        .epsilon(item_start, alts)
        .epsilon(alts, int)
        .epsilon(alts, name)
        .edge(int, Transition::atom(after_int, INT))
        .edge(name, Transition::set(after_name, IntervalSet::from_values([ID, STRING])))
        .epsilon(after_int, alts_end)
        .epsilon(after_name, alts_end)
        .epsilon(alts_end, item_stop)
        .decision(optional)
        .decision(entry)
        .decision(block)
        .decision(alts);
    b.build()
}

pub static ATN: Lazy<Atn> = Lazy::new(|| build().expect("sample automaton is well formed"));

static GRAMMAR: Lazy<Arc<GrammarInfo>> = Lazy::new(|| {
    Arc::new(GrammarInfo::new(
        "List.g4",
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
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token(",")]
    Comma,
    #[regex("[0-9]+")]
    Int,
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Id,
    #[regex(r#""[^"]*""#)]
    Str,
}

fn token_type(lexeme: &Lexeme) -> Option<i32> {
    Some(match lexeme {
        Lexeme::LBrack => LBRACK,
        Lexeme::RBrack => RBRACK,
        Lexeme::Comma => COMMA,
        Lexeme::Int => INT,
        Lexeme::Id => ID,
        Lexeme::Str => STRING,
    })
}

pub fn tokens(input: &str) -> CommonTokenStream<ListTokenSource> {
    let mut source = LogosTokenSource::new(input, token_type);
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

/// `list : '[' items? ']' EOF ;`
pub fn list(p: &mut Parser) -> Result<ContextId, ParseError> {
    let localctx = p.create_context(p.context(), p.state(), RULE_LIST);
    p.enter_rule(localctx, states::LIST_START as i32, RULE_LIST);
    let outcome = match list_alt(p, localctx) {
        Ok(()) => Ok(()),
        Err(e) => p.handle_rule_error(localctx, e),
    };
    p.exit_rule();
    outcome.map(|()| localctx)
}

fn list_alt(p: &mut Parser, localctx: ContextId) -> Result<(), ParseError> {
    p.enter_outer_alt(localctx, 1);
    p.set_state(states::LIST_LBRACK as i32);
    p.match_token(LBRACK)?;
    p.set_state(states::LIST_OPTIONAL as i32);
    p.sync()?;
    if p.adaptive_predict(DECISION_OPTIONAL_ITEMS)? == 1 {
        p.set_state(states::LIST_CALL_ITEMS as i32);
        items(p)?;
    }
    p.set_state(states::LIST_RBRACK as i32);
    p.match_token(RBRACK)?;
    p.set_state(states::LIST_EOF as i32);
    p.match_token(EOF)?;
    Ok(())
}

/// `items : item (',' item)* ;`
pub fn items(p: &mut Parser) -> Result<ContextId, ParseError> {
    let localctx = p.create_context(p.context(), p.state(), RULE_ITEMS);
    p.enter_rule(localctx, states::ITEMS_START as i32, RULE_ITEMS);
    let outcome = match items_alt(p, localctx) {
        Ok(()) => Ok(()),
        Err(e) => p.handle_rule_error(localctx, e),
    };
    p.exit_rule();
    outcome.map(|()| localctx)
}

fn items_alt(p: &mut Parser, localctx: ContextId) -> Result<(), ParseError> {
    p.enter_outer_alt(localctx, 1);
    p.set_state(states::ITEMS_CALL_ITEM as i32);
    item(p)?;
    p.set_state(states::ITEMS_LOOP_ENTRY as i32);
    p.sync()?;
    let mut alt = p.adaptive_predict(DECISION_MORE_ITEMS)?;
    while alt == 1 {
        p.set_state(states::ITEMS_COMMA as i32);
        p.match_token(COMMA)?;
        p.set_state(states::ITEMS_CALL_NEXT_ITEM as i32);
        item(p)?;
        p.set_state(states::ITEMS_LOOP_ENTRY as i32);
        p.sync()?;
        alt = p.adaptive_predict(DECISION_MORE_ITEMS)?;
    }
    Ok(())
}

/// `item : INT # number | (ID | STRING) # name ;`
pub fn item(p: &mut Parser) -> Result<ContextId, ParseError> {
    let mut localctx = p.create_context(p.context(), p.state(), RULE_ITEM);
    p.enter_rule(localctx, states::ITEM_START as i32, RULE_ITEM);
    let outcome = match item_alt(p, &mut localctx) {
        Ok(()) => Ok(()),
        Err(e) => p.handle_rule_error(localctx, e),
    };
    p.exit_rule();
    outcome.map(|()| localctx)
}

fn item_alt(p: &mut Parser, localctx: &mut ContextId) -> Result<(), ParseError> {
    p.set_state(states::ITEM_BLOCK as i32);
    p.sync()?;
    let alt = p.adaptive_predict(DECISION_ITEM)?;

    let (parent, invoking_state) = {
        let generic = &p.tree()[*localctx];
        (generic.parent, generic.invoking_state)
    };
    let labelled = p.create_context(parent, invoking_state, RULE_ITEM);
    p.tree_mut().copy_from(labelled, *localctx);
    p.tree_mut()[labelled].label = Some(if alt == 1 { "number" } else { "name" });
    *localctx = labelled;
    p.enter_outer_alt(labelled, alt);

    if alt == 1 {
        p.set_state(states::ITEM_INT as i32);
        p.match_token(INT)?;
    } else {
        p.set_state(states::ITEM_NAME as i32);
        let la = p.current_token().token_type;
        if la == ID || la == STRING {
            let handler = p.error_handler();
            handler.report_match(p);
            p.consume();
        } else {
            p.recover_inline()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_sit_on_the_named_states() {
        let at = |d| ATN.decision_state(d).unwrap().state_number;
        assert_eq!(at(DECISION_OPTIONAL_ITEMS), states::LIST_OPTIONAL);
        assert_eq!(at(DECISION_MORE_ITEMS), states::ITEMS_LOOP_ENTRY);
        assert_eq!(at(DECISION_ITEM), states::ITEM_BLOCK);
        assert_eq!(ATN.rule_start_state(RULE_ITEM), Some(states::ITEM_START));
    }

    #[test]
    fn items_are_relabelled_by_alternative() {
        let mut p = parser("[1, x, \"s\"]");
        let root = list(&mut p).unwrap();
        let tree = p.tree();
        assert_eq!(
            tree.to_string_tree(root, &RULE_NAMES),
            "(list [ (items (item 1) , (item x) , (item \"s\")) ] <EOF>)"
        );
        let items = tree.rule_context(root, RULE_ITEMS, 0).unwrap();
        let labels: Vec<_> = tree
            .rule_contexts(items, RULE_ITEM)
            .into_iter()
            .map(|c| tree[c].label)
            .collect();
        assert_eq!(labels, [Some("number"), Some("name"), Some("name")]);
    }
}
