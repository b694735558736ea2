//! Syntax errors
//!
//! A [`RecognitionError`] describes one point where the input stopped matching
//! the grammar. How the engine reacts is decided by an [`ErrorStrategy`]; the
//! runtime ships [`BailErrorStrategy`], which reports the first error and then
//! unwinds the whole parse with [`ParseError::Cancelled`].
//!
//! Reports reach the outside world through [`ErrorListener`]s. Automaton
//! corruption is not a syntax error and never goes through listeners; it
//! surfaces as [`crate::runtime::atn::AtnError`].

pub mod listener;
pub mod recognition;
pub mod strategy;

pub use listener::{ErrorListener, TracingErrorListener};
pub use recognition::{ParseCancellation, ParseError, RecognitionError, RecognitionErrorKind};
pub use strategy::{BailErrorStrategy, ErrorStrategy};
