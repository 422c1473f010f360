//! # move-analysis
//!
//! The semantic overlay: a second, document-wide pass that classifies identifiers using
//! context the line tokenizer cannot see (a struct used before it is declared, a name brought
//! in by `use`, a type parameter in scope).
//!
//!     lexeme       logos lexer over the whole text; comments, attributes and whitespace skipped
//!     overlay      declarations first, then one classification per identifier
//!     legend       the fixed, ordered token types and modifiers
//!     encoding     delta-encoded quintuples for the LSP wire format
//!     line_index   byte offsets to (line, UTF-16 column)
//!
//! The overlay is recomputed in full on every call; it does not share state with the line
//! driver, and consumers merge the two streams.

pub mod encoding;
pub mod legend;
pub mod lexeme;
pub mod line_index;
pub mod overlay;

pub use encoding::{encode, encode_flat, to_semantic_tokens};
pub use legend::{legend, Modifiers, TokenModifier, TokenType};
pub use overlay::{scan, SemanticToken, SymbolKind};
