//! Whole-document lexer for the semantic pass.
//!
//! Only the structure needed to find declarations survives: keywords that introduce one,
//! identifiers, path separators and delimiters. Literals are kept as opaque lexemes so that
//! nothing inside them is mistaken for an identifier.

use logos::{Lexer, Logos, Skip};
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Lexeme {
    #[regex(r"//[^\n]*", logos::skip)]
    _LineComment,

    // Block comments nest, which a regex cannot express.
    #[token("/*", block_comment)]
    _BlockComment,

    #[regex(r"#!?\[[^\]\n]*\]?", logos::skip)]
    _Attribute,

    #[token("module")]
    Module,
    #[token("use")]
    Use,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("fun")]
    Fun,
    #[token("const")]
    Const,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    // Also swallows suffixes and the digits of hex literals (`0x1F_u64`).
    #[regex(r"[0-9][0-9a-zA-Z_]*")]
    Number,
    #[regex(r"@[0-9a-zA-Z_]+")]
    Address,
    #[regex(r#"[bx]?"([^"\\\n]|\\.)*"?"#)]
    Str,

    #[token("::")]
    PathSep,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("!")]
    Bang,
}

fn block_comment(lex: &mut Lexer<'_, Lexeme>) -> Skip {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut consumed = 0;
    while depth > 0 && consumed < rest.len() {
        if rest[consumed..].starts_with(b"/*") {
            depth += 1;
            consumed += 2;
        } else if rest[consumed..].starts_with(b"*/") {
            depth -= 1;
            consumed += 2;
        } else {
            consumed += 1;
        }
    }
    lex.bump(consumed);
    Skip
}

/// A lexeme with its text and byte span in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexed<'s> {
    pub kind: Lexeme,
    pub text: &'s str,
    pub span: Range<usize>,
}

/// Lexes a whole document. Characters no rule accepts (operators, stray symbols) are dropped.
pub fn lex(source: &str) -> Vec<Lexed<'_>> {
    let mut lexer = Lexeme::lexer(source);
    let mut lexemes = Vec::new();

    while let Some(result) = lexer.next() {
        if let Ok(kind) = result {
            lexemes.push(Lexed {
                kind,
                text: lexer.slice(),
                span: lexer.span(),
            });
        }
    }

    lexemes
}
