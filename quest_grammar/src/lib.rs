#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Quest grammar and generator.
//!
//! Parses a small BNF-like grammar of quest tasks and expands it into abstract
//! [`Quest`] trees that the engine later binds to world resources.

pub mod generator;
pub mod motive;
pub mod parser;
pub mod quest;
pub mod task;

pub use generator::{ChoicePolicy, GenConfig, QuestGen};
pub use motive::Motive;
pub use parser::{Grammar, GrammarError, GrammarRule, Production, Symbol, parse_grammar};
pub use quest::{Quest, QuestNode};
pub use task::{TaskKind, TaskToken};

/// Text of the bundled default grammar.
pub const DEFAULT_GRAMMAR: &str = include_str!("../data/quests.bnf");

/// Parse the bundled default grammar.
///
/// # Errors
/// Only if the bundled grammar text is malformed.
pub fn default_grammar() -> Result<Grammar, GrammarError> {
    parse_grammar(DEFAULT_GRAMMAR)
}
