//! # move-lexer
//!
//! Stateful, line-oriented tokenizer for the Move language, driven by a declarative rule table.
//!
//! Layout
//!
//!     rules     grammar definitions (serde) and their compiled form, the `RuleTable`
//!     state     the state stack carried from one line to the next
//!     engine    `Tokenizer::tokenize_line`, one line at a time
//!     driver    `LineDriver`, per-document cache and incremental re-lexing
//!     grammar   the built-in Move grammar
//!
//! Typical use:
//!
//!     let mut driver = LineDriver::for_table(move_lang::rule_table());
//!     driver.load(&lines);
//!     // after the user edits line 12
//!     driver.relex(&lines, 12);
//!
//! The rule table is immutable and shared; each document owns its driver.

pub mod driver;
pub mod engine;
pub mod grammar;
pub mod rules;
pub mod state;
pub mod testing;
pub mod token;

pub use driver::{CacheEntry, LineDriver, RelexReport};
pub use engine::{LineTokens, Tokenizer, DEFAULT_MAX_STACK_DEPTH};
pub use grammar::move_lang;
pub use rules::{GrammarDefinition, GrammarError, RuleTable};
pub use state::{Frame, StateStack};
pub use token::{BracketRole, Token};
