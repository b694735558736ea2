//! Automaton
//!
//! The grammar automaton (ATN) is the shared, read-only description of a
//! grammar that recognizers walk while parsing.
//!
//! Structure:
//!     States live in an index-addressed array on [`Atn`]; every cross-state
//!     link (transition targets, block ends, loop-backs, rule stops) is a
//!     [`StateId`]. Removed states leave a tombstone so indices stay stable.
//!
//! The module also carries:
//! 1. The flat integer codec ([`serialize`], [`AtnDeserializer`]) and its
//!    16-bit word packing ([`encode_words`], [`decode_words`])
//! 2. The rule-bypass transform applied after decoding on request
//! 3. Structural verification ([`verify`])
//! 4. Single-token lookahead ([`Ll1Analyzer`], [`Atn::next_tokens`])

pub mod deserializer;
pub mod error;
pub mod graph;
pub mod lexer_action;
pub mod ll1;
pub mod options;
pub mod serializer;
pub mod state;
pub mod transition;
pub mod verify;
pub mod words;

pub use deserializer::{generate_rule_bypass_transitions, AtnDeserializer, SERIALIZED_VERSION};
pub use error::AtnError;
pub use graph::{Atn, GrammarType};
pub use lexer_action::{LexerAction, LexerActionType};
pub use ll1::{Ll1Analyzer, HIT_PRED};
pub use options::DeserializationOptions;
pub use serializer::{serialize, serialize_to_words};
pub use state::{AtnState, DecisionInfo, StateId, StateKind, StateType};
pub use transition::{Transition, TransitionKind, TransitionType};
pub use verify::verify;
pub use words::{decode_words, encode_words};
