//! Semantic overlay
//!
//!     `scan` makes two passes over the lexemes of a whole document:
//!
//!         1. declarations    modules, structs, enums and their variants, fields, functions,
//!                            constants, type parameters (with the span they are in scope for)
//!                            and the names a `use` brings in
//!         2. classification  every identifier, from the declarations and its neighbours
//!
//!     Identifiers the overlay has nothing to say about (locals, keywords, unknown names)
//!     produce no token; the classes from the line tokenizer stand for them.
//!
//!     Tokens come out in document order, one per identifier, never spanning lines.

use crate::legend::{Modifiers, TokenModifier, TokenType};
use crate::lexeme::{lex, Lexed, Lexeme};
use crate::line_index::{utf16_len, LineIndex};
use move_lexer::move_lang::{KEYWORDS, PRIMITIVES};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// What a declared name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Module,
    Struct,
    Enum,
    Variant,
    Field,
    Function,
    Constant,
    TypeParameter,
}

impl SymbolKind {
    pub fn token_type(self) -> TokenType {
        match self {
            SymbolKind::Module => TokenType::Namespace,
            SymbolKind::Struct => TokenType::Struct,
            SymbolKind::Enum => TokenType::Enum,
            SymbolKind::Variant => TokenType::Member,
            SymbolKind::Field => TokenType::Property,
            SymbolKind::Function => TokenType::Function,
            SymbolKind::Constant => TokenType::Variable,
            SymbolKind::TypeParameter => TokenType::TypeParameter,
        }
    }

    pub fn modifiers(self) -> Modifiers {
        match self {
            SymbolKind::Constant => {
                Modifiers::from(TokenModifier::Readonly).with(TokenModifier::Constant)
            }
            _ => Modifiers::NONE,
        }
    }
}

/// One classified identifier. Positions are zero-based; `start` and `length` count UTF-16
/// code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticToken {
    pub line: u32,
    pub start: u32,
    pub length: u32,
    pub token_type: TokenType,
    pub modifiers: Modifiers,
}

pub fn scan(text: &str) -> Vec<SemanticToken> {
    let lexemes = lex(text);
    let declarations = Declarations::collect(&lexemes);
    let index = LineIndex::new(text);

    let mut tokens = Vec::new();
    for (position, lexed) in lexemes.iter().enumerate() {
        if lexed.kind != Lexeme::Ident {
            continue;
        }
        let Some((token_type, modifiers)) = classify(&lexemes, position, &declarations) else {
            continue;
        };
        let (line, start) = index.position(text, lexed.span.start);
        tokens.push(SemanticToken {
            line,
            start,
            length: utf16_len(lexed.text),
            token_type,
            modifiers,
        });
    }

    tracing::debug!(
        lexemes = lexemes.len(),
        symbols = declarations.symbols.len(),
        tokens = tokens.len(),
        "semantic scan finished"
    );
    tokens
}

fn classify(
    lexemes: &[Lexed<'_>],
    position: usize,
    declarations: &Declarations<'_>,
) -> Option<(TokenType, Modifiers)> {
    let lexed = &lexemes[position];
    if let Some(kind) = declarations.sites.get(&lexed.span.start) {
        return Some((
            kind.token_type(),
            kind.modifiers().with(TokenModifier::Declaration),
        ));
    }

    let name = lexed.text;
    if PRIMITIVES.contains(&name) {
        return Some((TokenType::Type, TokenModifier::DefaultLibrary.into()));
    }
    if KEYWORDS.contains(&name) {
        return None;
    }
    if declarations.is_type_parameter(name, lexed.span.start) {
        return Some((TokenType::TypeParameter, Modifiers::NONE));
    }

    let previous = position.checked_sub(1).map(|at| lexemes[at].kind);
    let next = kind_at(lexemes, position + 1);
    let symbol = declarations.symbols.get(name).copied();

    if next == Some(Lexeme::PathSep) {
        return Some(match symbol {
            Some(kind @ (SymbolKind::Struct | SymbolKind::Enum)) => {
                (kind.token_type(), Modifiers::NONE)
            }
            _ => (TokenType::Namespace, Modifiers::NONE),
        });
    }
    if previous == Some(Lexeme::PathSep) && declarations.variants.contains(name) {
        return Some((TokenType::Member, Modifiers::NONE));
    }
    if previous == Some(Lexeme::Dot) {
        // `use fun .. as T.method` names a method even without a call
        let token_type = if next == Some(Lexeme::LParen) || declarations.in_use(lexed.span.start) {
            TokenType::Function
        } else {
            TokenType::Property
        };
        return Some((token_type, Modifiers::NONE));
    }
    if next == Some(Lexeme::Bang) && kind_at(lexemes, position + 2) == Some(Lexeme::LParen) {
        return Some((TokenType::Macro, Modifiers::NONE));
    }

    match symbol {
        // An imported module name is only a namespace where it cannot be a local.
        Some(SymbolKind::Module) if declarations.in_use(lexed.span.start) => {
            Some((TokenType::Namespace, Modifiers::NONE))
        }
        Some(SymbolKind::Module) => None,
        Some(kind) => Some((kind.token_type(), kind.modifiers())),
        None if next == Some(Lexeme::LParen) => Some((TokenType::Function, Modifiers::NONE)),
        None => None,
    }
}

fn kind_at(lexemes: &[Lexed<'_>], at: usize) -> Option<Lexeme> {
    lexemes.get(at).map(|lexed| lexed.kind)
}

fn ident<'a, 's>(lexemes: &'a [Lexed<'s>], at: usize) -> Option<&'a Lexed<'s>> {
    lexemes.get(at).filter(|lexed| lexed.kind == Lexeme::Ident)
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|ch| ch.is_ascii_uppercase())
}

struct TypeScope<'s> {
    names: Vec<&'s str>,
    span: Range<usize>,
}

/// Result of the declaration pass.
#[derive(Default)]
struct Declarations<'s> {
    /// Names visible anywhere in the document.
    symbols: HashMap<&'s str, SymbolKind>,
    /// Declaration sites, by byte offset.
    sites: HashMap<usize, SymbolKind>,
    variants: HashSet<&'s str>,
    type_scopes: Vec<TypeScope<'s>>,
    use_spans: Vec<Range<usize>>,
}

impl<'s> Declarations<'s> {
    fn collect(lexemes: &[Lexed<'s>]) -> Self {
        let mut declarations = Self::default();
        let mut position = 0;
        while position < lexemes.len() {
            position = match lexemes[position].kind {
                Lexeme::Module => declarations.module(lexemes, position + 1),
                Lexeme::Use => declarations.use_declaration(lexemes, position),
                Lexeme::Struct | Lexeme::Enum => declarations.type_declaration(lexemes, position),
                Lexeme::Fun => declarations.function(lexemes, position),
                Lexeme::Const => {
                    if let Some(name) = ident(lexemes, position + 1) {
                        declarations.declare(name, SymbolKind::Constant);
                    }
                    position + 1
                }
                _ => position + 1,
            };
        }
        declarations
    }

    fn declare(&mut self, name: &Lexed<'s>, kind: SymbolKind) {
        self.sites.insert(name.span.start, kind);
        match kind {
            SymbolKind::Variant => {
                self.variants.insert(name.text);
            }
            SymbolKind::Field | SymbolKind::TypeParameter => {}
            _ => {
                self.symbols.insert(name.text, kind);
            }
        }
    }

    /// Imports never shadow a declaration of the document itself.
    fn import(&mut self, name: &'s str, kind: SymbolKind) {
        self.symbols.entry(name).or_insert(kind);
    }

    fn is_type_parameter(&self, name: &str, offset: usize) -> bool {
        self.type_scopes
            .iter()
            .any(|scope| scope.span.contains(&offset) && scope.names.contains(&name))
    }

    fn in_use(&self, offset: usize) -> bool {
        self.use_spans.iter().any(|span| span.contains(&offset))
    }

    /// `module a::b::name`; returns the position after the name.
    fn module(&mut self, lexemes: &[Lexed<'s>], from: usize) -> usize {
        let mut at = from;
        while matches!(kind_at(lexemes, at), Some(Lexeme::Ident | Lexeme::Number))
            && kind_at(lexemes, at + 1) == Some(Lexeme::PathSep)
        {
            at += 2;
        }
        match ident(lexemes, at) {
            Some(name) => {
                self.declare(name, SymbolKind::Module);
                at + 1
            }
            None => at,
        }
    }

    /// `use a::b;`, `use a::b::{Self, C as D};`, `use fun a::b::f as T.method;`
    fn use_declaration(&mut self, lexemes: &[Lexed<'s>], start: usize) -> usize {
        let mut at = start + 1;
        let use_fun = kind_at(lexemes, at) == Some(Lexeme::Fun);
        if use_fun {
            at += 1;
        }

        // number of path segments before the item at the current brace level
        let mut segments = 0usize;
        let mut brace_bases = Vec::new();
        let mut qualifier = None;
        let mut last_item = None;
        let mut aliasing = false;

        while let Some(lexed) = lexemes.get(at) {
            match lexed.kind {
                Lexeme::Semi => {
                    at += 1;
                    break;
                }
                Lexeme::LBrace => brace_bases.push(segments),
                Lexeme::RBrace => segments = brace_bases.pop().unwrap_or(0),
                Lexeme::Comma => segments = brace_bases.last().copied().unwrap_or(0),
                Lexeme::Dot => {}
                Lexeme::Ident | Lexeme::Number
                    if kind_at(lexemes, at + 1) == Some(Lexeme::PathSep) =>
                {
                    qualifier = Some(lexed.text);
                    segments += 1;
                    at += 1;
                }
                Lexeme::Ident if lexed.text == "as" => aliasing = true,
                Lexeme::Ident if aliasing => {
                    // `as T.method` names the method; `T` is the receiver type
                    if !(use_fun && kind_at(lexemes, at + 1) == Some(Lexeme::Dot)) {
                        if let Some(kind) = last_item {
                            self.import(lexed.text, kind);
                        }
                        aliasing = false;
                    }
                }
                Lexeme::Ident if lexed.text == "Self" => {
                    if let Some(module) = qualifier {
                        self.import(module, SymbolKind::Module);
                    }
                    last_item = Some(SymbolKind::Module);
                }
                Lexeme::Ident => {
                    let kind = if use_fun {
                        SymbolKind::Function
                    } else if segments <= 1 {
                        SymbolKind::Module
                    } else if starts_uppercase(lexed.text) {
                        SymbolKind::Struct
                    } else {
                        SymbolKind::Function
                    };
                    self.import(lexed.text, kind);
                    last_item = Some(kind);
                }
                _ => break,
            }
            at += 1;
        }

        let end = lexemes[..at].last().map_or(lexemes[start].span.end, |last| last.span.end);
        self.use_spans.push(lexemes[start].span.start..end);
        at
    }

    /// `struct Name<T> has .. { fields }`, `enum Name { Variant { .. }, Variant(..) }`
    fn type_declaration(&mut self, lexemes: &[Lexed<'s>], start: usize) -> usize {
        let kind = if lexemes[start].kind == Lexeme::Enum {
            SymbolKind::Enum
        } else {
            SymbolKind::Struct
        };
        let Some(name) = ident(lexemes, start + 1) else {
            return start + 1;
        };
        self.declare(name, kind);

        let mut at = start + 2;
        if kind_at(lexemes, at) == Some(Lexeme::Lt) {
            at = self.type_parameters(lexemes, at);
        }
        while let Some(lexed) = lexemes.get(at) {
            match lexed.kind {
                Lexeme::LBrace | Lexeme::LParen => return self.body(lexemes, at, kind),
                Lexeme::Semi => return at + 1,
                // abilities
                Lexeme::Ident | Lexeme::Comma => at += 1,
                _ => return at,
            }
        }
        at
    }

    /// Fields and variants, from the opening delimiter to the matching close.
    fn body(&mut self, lexemes: &[Lexed<'s>], open: usize, kind: SymbolKind) -> usize {
        let field_depth = if kind == SymbolKind::Enum { 2 } else { 1 };
        let mut depth = 0usize;
        let mut at = open;
        while let Some(lexed) = lexemes.get(at) {
            match lexed.kind {
                Lexeme::LBrace | Lexeme::LParen => depth += 1,
                Lexeme::RBrace | Lexeme::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return at + 1;
                    }
                }
                Lexeme::Ident => {
                    let starts_entry = matches!(
                        lexemes[at - 1].kind,
                        Lexeme::LBrace | Lexeme::LParen | Lexeme::Comma
                    );
                    if kind == SymbolKind::Enum && depth == 1 && starts_entry {
                        self.declare(lexed, SymbolKind::Variant);
                    } else if depth == field_depth
                        && starts_entry
                        && kind_at(lexemes, at + 1) == Some(Lexeme::Colon)
                    {
                        self.declare(lexed, SymbolKind::Field);
                    }
                }
                _ => {}
            }
            at += 1;
        }
        at
    }

    /// `fun name<T>`; the body is left to the main loop.
    fn function(&mut self, lexemes: &[Lexed<'s>], start: usize) -> usize {
        let Some(name) = ident(lexemes, start + 1) else {
            return start + 1;
        };
        self.declare(name, SymbolKind::Function);
        let at = start + 2;
        if kind_at(lexemes, at) == Some(Lexeme::Lt) {
            return self.type_parameters(lexemes, at);
        }
        at
    }

    /// `<phantom T: store, U>` starting at `lt`; returns the position after the closing `>`.
    fn type_parameters(&mut self, lexemes: &[Lexed<'s>], lt: usize) -> usize {
        let mut names = Vec::new();
        let mut depth = 0usize;
        let mut at = lt;
        while let Some(lexed) = lexemes.get(at) {
            match lexed.kind {
                Lexeme::Lt => depth += 1,
                Lexeme::Gt => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        at += 1;
                        break;
                    }
                }
                Lexeme::Ident if depth == 1 && lexed.text != "phantom" => {
                    let previous = &lexemes[at - 1];
                    let opens_parameter = matches!(previous.kind, Lexeme::Lt | Lexeme::Comma)
                        || (previous.kind == Lexeme::Ident && previous.text == "phantom");
                    if opens_parameter {
                        names.push(lexed);
                    }
                }
                Lexeme::LBrace | Lexeme::LParen | Lexeme::Semi => break,
                _ => {}
            }
            at += 1;
        }

        let span = lexemes[lt].span.start..declaration_end(lexemes, at);
        for name in &names {
            self.declare(name, SymbolKind::TypeParameter);
        }
        self.type_scopes.push(TypeScope {
            names: names.iter().map(|name| name.text).collect(),
            span,
        });
        at
    }
}

/// End offset of the declaration continuing at `from`: its `;`, or the `}` closing its body.
fn declaration_end(lexemes: &[Lexed<'_>], from: usize) -> usize {
    let mut depth = 0usize;
    for lexed in lexemes.iter().skip(from) {
        match lexed.kind {
            Lexeme::LBrace => depth += 1,
            Lexeme::RBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return lexed.span.end;
                }
            }
            Lexeme::Semi if depth == 0 => return lexed.span.end,
            _ => {}
        }
    }
    lexemes.last().map_or(0, |lexed| lexed.span.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(text: &str) -> Vec<(String, TokenType, bool)> {
        let tokens = scan(text);
        let lines: Vec<&str> = text.lines().collect();
        tokens
            .iter()
            .map(|token| {
                let line = lines[token.line as usize];
                let start = token.start as usize;
                let name = line[start..start + token.length as usize].to_string();
                (
                    name,
                    token.token_type,
                    token.modifiers.contains(TokenModifier::Declaration),
                )
            })
            .collect()
    }

    #[test]
    fn struct_used_before_its_declaration() {
        let text = "module m::n {\n    fun f(): Pool { Pool {} }\n    struct Pool {}\n}";
        let found = classes(text);
        assert!(found.contains(&("Pool".to_string(), TokenType::Struct, false)));
        assert!(found.contains(&("Pool".to_string(), TokenType::Struct, true)));
        assert_eq!(found[0], ("m".to_string(), TokenType::Namespace, false));
        assert_eq!(found[1], ("n".to_string(), TokenType::Namespace, true));
    }

    #[test]
    fn type_parameters_are_scoped_to_their_declaration() {
        let text = "fun a<T>(x: T) {}\nfun b(x: T) {}";
        let found = classes(text);
        let type_params: Vec<_> = found
            .iter()
            .filter(|(_, kind, _)| *kind == TokenType::TypeParameter)
            .collect();
        assert_eq!(type_params.len(), 2);
        assert!(found
            .iter()
            .all(|(name, kind, _)| name != "T" || *kind == TokenType::TypeParameter));
        assert_eq!(found.iter().filter(|(name, _, _)| name == "T").count(), 2);
    }

    #[test]
    fn imports_classify_by_shape() {
        let text = "use sui::{coin, balance::Balance};\nuse std::vector::{length as len};\nfun f(c: Balance) { len(coin::value(c)) }";
        let found = classes(text);
        assert!(found.contains(&("coin".to_string(), TokenType::Namespace, false)));
        assert!(found.contains(&("Balance".to_string(), TokenType::Struct, false)));
        assert!(found.contains(&("len".to_string(), TokenType::Function, false)));
        assert!(found.contains(&("value".to_string(), TokenType::Function, false)));
    }

    #[test]
    fn imported_module_name_is_not_a_namespace_as_a_local() {
        let text = "use sui::coin;\nfun f(coin: u64) { coin }";
        let found = classes(text);
        let coins: Vec<_> = found.iter().filter(|(name, _, _)| name == "coin").collect();
        assert_eq!(coins.len(), 1);
    }

    #[test]
    fn enum_variants_and_fields() {
        let text = "enum Shape { Circle { radius: u64 }, Empty }\nfun f(s: Shape) { Shape::Circle; s.radius }";
        let found = classes(text);
        assert!(found.contains(&("Circle".to_string(), TokenType::Member, true)));
        assert!(found.contains(&("Empty".to_string(), TokenType::Member, true)));
        assert!(found.contains(&("radius".to_string(), TokenType::Property, true)));
        assert!(found.contains(&("Circle".to_string(), TokenType::Member, false)));
        assert!(found.contains(&("radius".to_string(), TokenType::Property, false)));
        assert!(found.contains(&("Shape".to_string(), TokenType::Enum, false)));
    }

    #[test]
    fn tokens_are_in_document_order() {
        let text = "module a::b {\n    const X: u8 = 1;\n    fun f() { g(X); h!(X) }\n}";
        let tokens = scan(text);
        assert!(tokens
            .windows(2)
            .all(|pair| (pair[0].line, pair[0].start) < (pair[1].line, pair[1].start)));
    }
}
