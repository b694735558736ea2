//! Lexer automata: rule token types, mode starts and the action table travel
//! through the binary form.

use atn_runtime::runtime::atn::{
    serialize, serialize_to_words, AtnDeserializer, GrammarType, LexerAction, StateType, Transition,
};
use atn_runtime::runtime::testing::AtnBuilder;

const INT: i32 = 1;
const WS: i32 = 2;
const ID: i32 = 3;

/// ```text
/// INT : [0-9] ;
/// WS  : ' ' -> skip ;
/// ID  : [À-\u{10FFFF}] ;
/// ```
fn lexer() -> atn_runtime::runtime::atn::Atn {
    let mut b = AtnBuilder::new(GrammarType::Lexer, ID);
    let tokens = b.state(0, StateType::TokenStart);

    let int_start = b.rule_start(0, false);
    let int_stop = b.rule_stop(0);
    let digit = b.basic(0);
    let after_digit = b.basic(0);

    let ws_start = b.rule_start(1, false);
    let ws_stop = b.rule_stop(1);
    let space = b.basic(1);
    let skip = b.basic(1);
    let after_skip = b.basic(1);

    let id_start = b.rule_start(2, false);
    let id_stop = b.rule_stop(2);
    let letter = b.basic(2);
    let after_letter = b.basic(2);

    b.epsilon(tokens, int_start)
        .epsilon(tokens, ws_start)
        .epsilon(tokens, id_start)
        .epsilon(int_start, digit)
        .edge(digit, Transition::range(after_digit, '0' as i32, '9' as i32))
        .epsilon(after_digit, int_stop)
        .epsilon(ws_start, space)
        .edge(space, Transition::atom(skip, ' ' as i32))
        .edge(skip, Transition::action(after_skip, 1, 0, false))
        .epsilon(after_skip, ws_stop)
        .epsilon(id_start, letter)
        .edge(letter, Transition::range(after_letter, 0xC0, 0x10FFFF))
        .epsilon(after_letter, id_stop)
        .decision(tokens)
        .mode_start(tokens)
        .rule_token_types(vec![INT, WS, ID])
        .lexer_actions(vec![LexerAction::Skip]);
    b.build().unwrap()
}

#[test]
fn lexer_tables_survive_the_round_trip() {
    let atn = lexer();
    let decoded = AtnDeserializer::default().deserialize(&serialize(&atn).unwrap()).unwrap();
    assert_eq!(decoded, atn);

    assert_eq!(decoded.grammar_type, GrammarType::Lexer);
    assert_eq!(decoded.rule_token_type(1), Some(WS));
    assert_eq!(decoded.rule_token_types(), &[INT, WS, ID]);
    assert_eq!(decoded.lexer_actions(), &[LexerAction::Skip]);
    assert_eq!(decoded.mode_start_states(), &[0]);
    assert_eq!(decoded.decision_count(), 1);
}

#[test]
fn code_points_past_the_word_limit_take_two_words() {
    let atn = lexer();
    let data = serialize(&atn).unwrap();
    let words = serialize_to_words(&atn).unwrap();
    // 0x10FFFF is the only value above 0x7FFF.
    assert_eq!(words.len(), data.len() + 1);
    assert_eq!(AtnDeserializer::default().deserialize_words(&words).unwrap(), atn);
}
