//! Tokens
//!
//!     A token is a classified span of a single line. Columns and lengths are UTF-8 byte
//!     offsets relative to the start of the line they were produced for, so `&line[token.range()]`
//!     is always valid. Classes are free-form dotted strings (`keyword.module`, `type.primitive`)
//!     and are shared with the rule table, so cloning a token never copies the class text.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

/// Role of a token in bracket matching, when the rule that produced it declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BracketRole {
    #[serde(rename = "@open")]
    Open,
    #[serde(rename = "@close")]
    Close,
}

/// A classified span of one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub start: usize,
    pub length: usize,
    pub class: Arc<str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket: Option<BracketRole>,
}

impl Token {
    pub fn new(start: usize, length: usize, class: Arc<str>) -> Self {
        Self {
            start,
            length,
            class,
            bracket: None,
        }
    }

    pub fn with_bracket(mut self, bracket: Option<BracketRole>) -> Self {
        self.bracket = bracket;
        self
    }

    /// Exclusive end column.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// The slice of `line` this token covers.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.range()]
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}
