//! Main module for the parsing runtime

pub mod atn;
pub mod config;
pub mod error;
pub mod interpreter_data;
pub mod misc;
pub mod parser;
pub mod testing;
pub mod token;
pub mod tree;
