//! Rule tables
//!
//!     A grammar is an ordered set of named states. Each state holds an ordered list of rules;
//!     each rule pairs an anchored regex with an action. The tokenizer tries the rules of the
//!     state on top of the stack in order and takes the first one that matches.
//!
//!     This module holds both sides of that: the serializable `GrammarDefinition` grammars are
//!     written in, and the compiled `RuleTable` the tokenizer executes.

pub mod action;
pub mod definition;
pub mod error;
pub mod table;

pub use action::{Action, ActionKind, Guard, StateId, Template, Transition};
pub use definition::{ActionDefinition, BracketDefinition, GrammarDefinition, RuleDefinition};
pub use error::GrammarError;
pub use table::{Rule, RuleTable, SetId, State};
