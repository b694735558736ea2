//! Serialized automaton layout and the decode paths built on it.
//!
//! The expression grammar's automaton is small enough to spell out in full,
//! so the encoder's output is pinned value by value.

use atn_runtime::runtime::atn::{
    decode_words, serialize, serialize_to_words, Atn, AtnDeserializer, AtnError, DeserializationOptions, StateType,
    Transition, SERIALIZED_VERSION,
};
use atn_runtime::runtime::interpreter_data::{InterpreterData, RawInterpreterData};
use atn_runtime::runtime::misc::IntervalSet;
use atn_runtime::runtime::testing::{expr, list, AtnBuilder};
use atn_runtime::runtime::token::EOF;
use proptest::prelude::*;

#[rustfmt::skip]
const EXPR_ATN: [i32; 156] = [
    4, 1, 2,
    // states
    18,
    2, 0,  7, 0,  1, 0,  1, 0,  1, 0,
    2, 1,  7, 1,  1, 1,  1, 1,  10, 1,  5, 1, 15,  1, 1,  1, 1,  1, 1,  1, 1,  8, 1,  9, 1,  12, 1, 16,
    // non-greedy, precedence rule starts
    0,
    1, 5,
    // rules, modes, sets
    2, 0, 5,
    0,
    0,
    // edges
    17,
    0, 2, 1, 0, 0, 0,
    2, 3, 3, 5, 1, 0,
    3, 4, 5, 0, 0, 1,
    4, 1, 1, 0, 0, 0,
    5, 7, 1, 0, 0, 0,
    7, 8, 5, 1, 0, 0,
    8, 9, 1, 0, 0, 0,
    9, 10, 1, 0, 0, 0,
    9, 17, 1, 0, 0, 0,
    10, 11, 1, 0, 0, 0,
    11, 12, 10, 2, 0, 0,
    12, 13, 5, 2, 0, 0,
    13, 14, 3, 5, 1, 3,
    14, 15, 1, 0, 0, 0,
    15, 16, 1, 0, 0, 0,
    16, 9, 1, 0, 0, 0,
    17, 6, 1, 0, 0, 0,
    // decisions
    2, 9, 10,
];

#[test]
fn expression_automaton_layout() {
    let data = serialize(&expr::ATN).unwrap();
    assert_eq!(data[0], SERIALIZED_VERSION);
    assert_eq!(data, EXPR_ATN.to_vec());
}

#[test]
fn fixed_layout_decodes_to_the_built_automaton() {
    let atn = AtnDeserializer::default().deserialize(&EXPR_ATN).unwrap();
    assert_eq!(atn, *expr::ATN);
    assert!(atn.is_left_recursive(expr::RULE_EXPR));
    assert!(!atn.is_left_recursive(expr::RULE_PROG));
}

#[test]
fn word_form_decodes_like_integer_form() {
    let words = serialize_to_words(&expr::ATN).unwrap();
    // No negative or large values, so one word each.
    assert_eq!(words.len(), EXPR_ATN.len());
    assert_eq!(decode_words(&words).unwrap(), EXPR_ATN.to_vec());
    assert_eq!(AtnDeserializer::default().deserialize_words(&words).unwrap(), *expr::ATN);
}

/// Decode `data` with bypass alternatives and verification on. Each rule
/// start must then enter a block offering the rule's own body and the bypass
/// token, and the rewritten automaton must encode and decode again.
fn decode_with_bypass(data: &[i32]) -> Atn {
    let atn = AtnDeserializer::new(DeserializationOptions {
        verify_atn: true,
        generate_rule_bypass_transitions: true,
    })
    .deserialize(data)
    .unwrap();

    for rule in 0..atn.rule_count() {
        let start = atn.rule_start_state(rule).unwrap();
        let block = atn.state(start).unwrap().transition(0).unwrap().target;
        assert_eq!(atn.state(block).unwrap().state_type(), StateType::BlockStart);
        assert_eq!(atn.state(block).unwrap().transition_count(), 2);
    }

    // Bypass token types are not part of the encoding.
    let again = serialize(&atn).unwrap();
    let decoded = AtnDeserializer::default().deserialize(&again).unwrap();
    assert_eq!(decoded.decision_count(), atn.decision_count());
    assert_eq!(decoded.state_count(), atn.state_count());
    atn
}

#[test]
fn bypass_alternatives_survive_verification() {
    let atn = decode_with_bypass(&EXPR_ATN);
    assert_eq!(atn.rule_token_types(), &[expr::PLUS + 1, expr::PLUS + 2]);
    assert_eq!(atn.decision_count(), expr::ATN.decision_count() + 2);
}

#[test]
fn bypass_alternatives_wrap_loops_and_labelled_blocks() {
    let atn = decode_with_bypass(&serialize(&list::ATN).unwrap());
    assert_eq!(
        atn.rule_token_types(),
        &[list::STRING + 1, list::STRING + 2, list::STRING + 3]
    );
    assert_eq!(atn.decision_count(), list::ATN.decision_count() + 3);
    assert_eq!(atn.state_count(), list::ATN.state_count() + 3 * 3);
}

#[test]
fn grammar_caches_its_bypass_automaton() {
    let grammar = expr::grammar();
    let first = grammar.atn_with_bypass_alts().unwrap();
    let second = grammar.atn_with_bypass_alts().unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.decision_count(), expr::ATN.decision_count() + 2);
    // The grammar's own automaton is untouched.
    assert_eq!(grammar.atn.decision_count(), expr::ATN.decision_count());
}

#[test]
fn interpreter_data_carries_the_layout() {
    let raw = RawInterpreterData {
        literal_names: expr::LITERAL_NAMES.iter().map(|n| n.map(str::to_string)).collect(),
        symbolic_names: expr::SYMBOLIC_NAMES.iter().map(|n| n.map(str::to_string)).collect(),
        rule_names: expr::RULE_NAMES.iter().map(|n| n.to_string()).collect(),
        channels: None,
        modes: None,
        atn: EXPR_ATN.to_vec(),
    };
    let text = raw.to_text();
    assert!(text.ends_with("atn:\n[4, 1, 2, 18, 2, 0, 7, 0, 1, 0, 1, 0, 1, 0, 2, 1, 7, 1, 1, 1, 1, 1, 10, 1, 5, 1, 15, 1, 1, 1, 1, 1, 1, 1, 1, 8, 1, 9, 1, 12, 1, 16, 0, 1, 5, 2, 0, 5, 0, 0, 17, 0, 2, 1, 0, 0, 0, 2, 3, 3, 5, 1, 0, 3, 4, 5, 0, 0, 1, 4, 1, 1, 0, 0, 0, 5, 7, 1, 0, 0, 0, 7, 8, 5, 1, 0, 0, 8, 9, 1, 0, 0, 0, 9, 10, 1, 0, 0, 0, 9, 17, 1, 0, 0, 0, 10, 11, 1, 0, 0, 0, 11, 12, 10, 2, 0, 0, 12, 13, 5, 2, 0, 0, 13, 14, 3, 5, 1, 3, 14, 15, 1, 0, 0, 0, 15, 16, 1, 0, 0, 0, 16, 9, 1, 0, 0, 0, 17, 6, 1, 0, 0, 0, 2, 9, 10]\n"));

    let data = InterpreterData::parse(&text).unwrap();
    let grammar = data.into_grammar_info("Expr.g4");
    assert_eq!(grammar.rule_index("expr"), Some(expr::RULE_EXPR));
    assert_eq!(*grammar.atn, *expr::ATN);
}

#[test]
fn corrupt_state_reference_is_rejected() {
    let mut data = EXPR_ATN.to_vec();
    // The star block start's end state points past the state table.
    data[26] = 40;
    assert_eq!(
        AtnDeserializer::default().deserialize(&data),
        Err(AtnError::InvalidStateReference { index: 40 })
    );
}

/// `r : l1 l2 ... ln (a1 | a2 | ... | {set}) ;` as a single rule.
fn chain_with_choice(labels: &[i32], alts: &[i32], set: &[i32]) -> Atn {
    let mut b = AtnBuilder::parser(64);
    let start = b.rule_start(0, false);
    let stop = b.rule_stop(0);
    let block = b.state(0, StateType::BlockStart);
    let end = b.state(0, StateType::BlockEnd);
    b.block_end(block, end);

    let mut cur = b.basic(0);
    b.epsilon(start, cur);
    for &label in labels {
        let next = b.basic(0);
        b.edge(cur, Transition::atom(next, label));
        cur = next;
    }
    b.epsilon(cur, block);
    for &label in alts {
        let alt = b.basic(0);
        b.epsilon(block, alt).edge(alt, Transition::atom(end, label));
    }
    if !set.is_empty() {
        let alt = b.basic(0);
        b.epsilon(block, alt)
            .edge(alt, Transition::set(end, IntervalSet::from_values(set.iter().copied())));
    }
    b.epsilon(end, stop).decision(block);
    b.build().unwrap()
}

fn token_type() -> impl Strategy<Value = i32> {
    prop_oneof![Just(EOF), 1i32..=64]
}

proptest! {
    #[test]
    fn built_automata_decode_to_themselves(
        labels in prop::collection::vec(token_type(), 0..10),
        alts in prop::collection::vec(1i32..=64, 1..5),
        set in prop::collection::vec(1i32..=64, 0..6),
    ) {
        let atn = chain_with_choice(&labels, &alts, &set);
        let data = serialize(&atn).unwrap();
        prop_assert_eq!(AtnDeserializer::default().deserialize(&data).unwrap(), atn.clone());
        prop_assert_eq!(decode_with_bypass(&data).decision_count(), atn.decision_count() + 1);

        let words = serialize_to_words(&atn).unwrap();
        prop_assert_eq!(AtnDeserializer::default().deserialize_words(&words).unwrap(), atn);
    }

    #[test]
    fn single_value_corruption_never_panics(index in 0usize..156, value in -3i32..64) {
        let mut data = EXPR_ATN.to_vec();
        data[index] = value;
        let _ = AtnDeserializer::default().deserialize(&data);
    }

    #[test]
    fn word_packing_round_trips(values in prop::collection::vec(prop_oneof![Just(-1i32), 0i32..0x7FFF, 0x8000i32..i32::MAX], 0..48)) {
        let words = atn_runtime::runtime::atn::encode_words(&values).unwrap();
        prop_assert_eq!(decode_words(&words).unwrap(), values);
    }
}
