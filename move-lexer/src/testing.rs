//! Helpers for asserting on token streams.
//!
//! Used by the unit tests of this crate, by its integration tests and by downstream crates
//! that want to check highlighting output without spelling out byte offsets.

use crate::token::Token;

/// `(class, text)` for every token.
pub fn pairs(line: &str, tokens: &[Token]) -> Vec<(String, String)> {
    tokens
        .iter()
        .map(|token| (token.class().to_string(), token.text(line).to_string()))
        .collect()
}

/// Like [`pairs`], without `white` tokens.
pub fn significant(line: &str, tokens: &[Token]) -> Vec<(String, String)> {
    pairs(line, tokens)
        .into_iter()
        .filter(|(class, _)| class != "white")
        .collect()
}

/// One `class(text)` entry per token, separated by spaces.
pub fn render(line: &str, tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| format!("{}({})", token.class(), token.text(line)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Checks that tokens are non-empty, contiguous and cover the line from start to end.
pub fn check_tiles(line: &str, tokens: &[Token]) -> Result<(), String> {
    let mut cursor = 0;
    for (index, token) in tokens.iter().enumerate() {
        if token.length == 0 {
            return Err(format!("token {index} is empty"));
        }
        if token.start != cursor {
            return Err(format!(
                "token {index} starts at {} but the previous one ended at {cursor}",
                token.start
            ));
        }
        if !line.is_char_boundary(token.start) || !line.is_char_boundary(token.end()) {
            return Err(format!("token {index} splits a character"));
        }
        cursor = token.end();
    }
    if cursor != line.len() {
        return Err(format!("tokens end at {cursor}, line length is {}", line.len()));
    }
    Ok(())
}

pub fn assert_tiles(line: &str, tokens: &[Token]) {
    if let Err(message) = check_tiles(line, tokens) {
        panic!("tokens do not tile {line:?}: {message}\n{tokens:#?}");
    }
}
