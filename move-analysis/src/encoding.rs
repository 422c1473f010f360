//! LSP wire encoding
//!
//!     Each token becomes five integers: line delta, start delta (relative to the previous
//!     token only when both are on the same line), length, type index and modifier bits.
//!     Tokens must already be sorted by position, which `overlay::scan` guarantees.

use crate::overlay::SemanticToken;
use lsp_types::SemanticTokens;

pub fn encode(tokens: &[SemanticToken]) -> Vec<lsp_types::SemanticToken> {
    let mut data = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for token in tokens {
        if token.length == 0 {
            continue;
        }
        let delta_line = token.line.saturating_sub(prev_line);
        let delta_start = if delta_line == 0 {
            token.start.saturating_sub(prev_start)
        } else {
            token.start
        };
        data.push(lsp_types::SemanticToken {
            delta_line,
            delta_start,
            length: token.length,
            token_type: token.token_type.index(),
            token_modifiers_bitset: token.modifiers.bits(),
        });
        prev_line = token.line;
        prev_start = token.start;
    }

    data
}

/// The flat `u32` array as it appears in a `textDocument/semanticTokens/full` response.
pub fn encode_flat(tokens: &[SemanticToken]) -> Vec<u32> {
    encode(tokens)
        .into_iter()
        .flat_map(|token| {
            [
                token.delta_line,
                token.delta_start,
                token.length,
                token.token_type,
                token.token_modifiers_bitset,
            ]
        })
        .collect()
}

pub fn to_semantic_tokens(tokens: &[SemanticToken]) -> SemanticTokens {
    SemanticTokens {
        result_id: None,
        data: encode(tokens),
    }
}
