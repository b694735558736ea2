//! Optional blocks, loops, set matches and labelled alternatives, driven
//! through `list : '[' items? ']' EOF ;`.

use std::cell::RefCell;
use std::rc::Rc;

use atn_runtime::runtime::error::RecognitionErrorKind;
use atn_runtime::runtime::testing::list::{self, RULE_ITEM, RULE_ITEMS, RULE_NAMES};
use atn_runtime::runtime::testing::{CollectingErrorListener, EventRecorder};
use atn_runtime::runtime::tree::{Child, ContextId, ParseTree};
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("[]", "(list [ ] <EOF>)")]
#[case("[7]", "(list [ (items (item 7)) ] <EOF>)")]
#[case("[a, 2]", "(list [ (items (item a) , (item 2)) ] <EOF>)")]
fn lists_parse(#[case] input: &str, #[case] expected: &str) {
    let mut p = list::parser(input);
    let root = list::list(&mut p).unwrap();
    assert_eq!(p.tree().to_string_tree(root, &RULE_NAMES), expected);
    assert!(p.is_matched_eof());
}

#[test]
fn chosen_alternatives_are_rendered() {
    let mut p = list::parser("[1, a]");
    let root = list::list(&mut p).unwrap();
    assert_eq!(
        p.tree().to_string_tree_with_alts(root, &RULE_NAMES),
        "(list:1 [ (items:1 (item:1 1) , (item:2 a)) ] <EOF>)"
    );
}

#[test]
fn relabelled_contexts_keep_their_place() {
    let mut p = list::parser("[x]");
    let root = list::list(&mut p).unwrap();
    let tree = p.tree();
    let items = tree.rule_context(root, RULE_ITEMS, 0).unwrap();
    let item = tree.rule_context(items, RULE_ITEM, 0).unwrap();

    assert_eq!(tree[item].parent, Some(items));
    assert_eq!(tree[item].invoking_state, list::states::ITEMS_CALL_ITEM as i32);
    assert_eq!(tree[item].label, Some("name"));
    assert_eq!(tree[item].start.as_ref().unwrap().text, "x");
    assert_eq!(tree[item].stop.as_ref().unwrap().text, "x");
    assert_eq!(tree[items].child_count(), 1);
}

#[test]
fn listeners_see_one_exit_per_entry() {
    let mut p = list::parser("[1, \"two\"]");
    let recorder = Rc::new(RefCell::new(EventRecorder::new(&RULE_NAMES)));
    p.add_parse_listener(recorder.clone());
    list::list(&mut p).unwrap();

    let events = recorder.borrow().events.clone();
    assert_eq!(
        events,
        [
            "enter:list",
            "t:[",
            "enter:items",
            "enter:item",
            "t:1",
            "exit:item",
            "t:,",
            "enter:item",
            "t:\"two\"",
            "exit:item",
            "exit:items",
            "t:]",
            "t:<EOF>",
            "exit:list",
        ]
    );
}

#[rstest]
#[case("[1 2]", "1:3 no viable alternative at input '2'")]
#[case("[1,]", "1:3 no viable alternative at input ']'")]
#[case("[,]", "1:1 no viable alternative at input ','")]
#[case("[1,", "1:3 no viable alternative at input '<EOF>'")]
fn broken_lists_report_once(#[case] input: &str, #[case] message: &str) {
    let mut p = list::parser(input);
    let errors = Rc::new(RefCell::new(CollectingErrorListener::default()));
    p.remove_error_listeners();
    p.add_error_listener(errors.clone());

    let error = list::list(&mut p).unwrap_err();
    assert!(error.is_cancellation());
    assert!(matches!(error.cause().unwrap().kind, RecognitionErrorKind::NoViableAlt { .. }));
    assert_eq!(errors.borrow().messages, [message]);
    assert_eq!(p.number_of_syntax_errors(), 1);
}

#[test]
fn stray_item_expects_a_separator_or_the_close() {
    let mut p = list::parser("[1 2]");
    p.remove_error_listeners();
    let error = list::list(&mut p).unwrap_err();
    let cause = error.cause().unwrap();
    assert_eq!(cause.offending_state, list::states::ITEMS_LOOP_ENTRY as i32);
    assert_eq!(
        cause.expected_tokens.as_ref().unwrap().to_vec(),
        vec![list::RBRACK, list::COMMA]
    );
}

#[test]
fn missing_open_bracket_is_a_silent_mismatch() {
    let mut p = list::parser("1]");
    let errors = Rc::new(RefCell::new(CollectingErrorListener::default()));
    p.remove_error_listeners();
    p.add_error_listener(errors.clone());

    let error = list::list(&mut p).unwrap_err();
    assert_eq!(error.cause().unwrap().kind, RecognitionErrorKind::InputMismatch);
    assert!(errors.borrow().messages.is_empty());
}

fn terminal_indices(tree: &ParseTree, ctx: ContextId, out: &mut Vec<i32>) {
    for child in tree[ctx].children().unwrap_or_default() {
        match child {
            Child::Rule(c) => terminal_indices(tree, *c, out),
            Child::Terminal(node) | Child::Error(node) => out.push(node.symbol.token_index),
        }
    }
}

fn element() -> impl Strategy<Value = String> {
    prop_oneof!["[0-9]{1,3}", "[a-z][a-z0-9_]{0,4}", "\"[a-z ]{0,4}\""]
}

proptest! {
    #[test]
    fn every_context_hangs_off_one_parent(elements in prop::collection::vec(element(), 0..8)) {
        let input = format!("[{}]", elements.join(", "));
        let mut p = list::parser(&input);
        let root = list::list(&mut p).unwrap();
        let tree = p.tree();

        let contexts = tree.descendants(root);
        for &c in &contexts[1..] {
            let parent = tree[c].parent.unwrap();
            let slots = tree[parent]
                .children()
                .unwrap_or_default()
                .iter()
                .filter(|child| child.as_rule() == Some(c))
                .count();
            prop_assert_eq!(slots, 1);
            prop_assert!(contexts.contains(&parent));
        }

        let items: Vec<_> = contexts.iter().filter(|&&c| tree[c].rule_index == RULE_ITEM).collect();
        prop_assert_eq!(items.len(), elements.len());
        for (&&c, text) in items.iter().zip(&elements) {
            let is_number = text.chars().all(|ch| ch.is_ascii_digit());
            prop_assert_eq!(tree[c].label, Some(if is_number { "number" } else { "name" }));
            prop_assert_eq!(tree[c].alt_number, if is_number { 1 } else { 2 });
        }

        let mut indices = Vec::new();
        terminal_indices(tree, root, &mut indices);
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        // Brackets, items, separators and EOF.
        let expected = if elements.is_empty() { 3 } else { 2 * elements.len() + 2 };
        prop_assert_eq!(indices.len(), expected);
    }
}
