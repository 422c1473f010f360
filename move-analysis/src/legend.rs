//! Semantic token legend
//!
//!     Token types are sent as indices into `TokenType::ALL` and modifiers as bits in the order
//!     of `TokenModifier::ALL`. Both lists are part of the wire contract: entries are only ever
//!     appended.

use lsp_types::{SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Comment,
    String,
    Keyword,
    Number,
    Regexp,
    Operator,
    Namespace,
    Type,
    Struct,
    Class,
    Interface,
    Enum,
    TypeParameter,
    Function,
    Member,
    Macro,
    Variable,
    Parameter,
    Property,
    Label,
    Unsupported,
}

impl TokenType {
    pub const ALL: [TokenType; 21] = [
        TokenType::Comment,
        TokenType::String,
        TokenType::Keyword,
        TokenType::Number,
        TokenType::Regexp,
        TokenType::Operator,
        TokenType::Namespace,
        TokenType::Type,
        TokenType::Struct,
        TokenType::Class,
        TokenType::Interface,
        TokenType::Enum,
        TokenType::TypeParameter,
        TokenType::Function,
        TokenType::Member,
        TokenType::Macro,
        TokenType::Variable,
        TokenType::Parameter,
        TokenType::Property,
        TokenType::Label,
        TokenType::Unsupported,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Comment => "comment",
            TokenType::String => "string",
            TokenType::Keyword => "keyword",
            TokenType::Number => "number",
            TokenType::Regexp => "regexp",
            TokenType::Operator => "operator",
            TokenType::Namespace => "namespace",
            TokenType::Type => "type",
            TokenType::Struct => "struct",
            TokenType::Class => "class",
            TokenType::Interface => "interface",
            TokenType::Enum => "enum",
            TokenType::TypeParameter => "typeParameter",
            TokenType::Function => "function",
            TokenType::Member => "member",
            TokenType::Macro => "macro",
            TokenType::Variable => "variable",
            TokenType::Parameter => "parameter",
            TokenType::Property => "property",
            TokenType::Label => "label",
            TokenType::Unsupported => "unsupported",
        }
    }

    /// Position in the legend.
    pub fn index(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenModifier {
    Documentation,
    Declaration,
    Definition,
    Static,
    Abstract,
    Deprecated,
    Readonly,
    DefaultLibrary,
    Async,
    Attribute,
    Callable,
    Constant,
    Consuming,
    ControlFlow,
    CrateRoot,
    Injected,
    IntraDocLink,
    Library,
    Mutable,
    Public,
    Reference,
    Trait,
    Unsafe,
}

impl TokenModifier {
    pub const ALL: [TokenModifier; 23] = [
        TokenModifier::Documentation,
        TokenModifier::Declaration,
        TokenModifier::Definition,
        TokenModifier::Static,
        TokenModifier::Abstract,
        TokenModifier::Deprecated,
        TokenModifier::Readonly,
        TokenModifier::DefaultLibrary,
        TokenModifier::Async,
        TokenModifier::Attribute,
        TokenModifier::Callable,
        TokenModifier::Constant,
        TokenModifier::Consuming,
        TokenModifier::ControlFlow,
        TokenModifier::CrateRoot,
        TokenModifier::Injected,
        TokenModifier::IntraDocLink,
        TokenModifier::Library,
        TokenModifier::Mutable,
        TokenModifier::Public,
        TokenModifier::Reference,
        TokenModifier::Trait,
        TokenModifier::Unsafe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenModifier::Documentation => "documentation",
            TokenModifier::Declaration => "declaration",
            TokenModifier::Definition => "definition",
            TokenModifier::Static => "static",
            TokenModifier::Abstract => "abstract",
            TokenModifier::Deprecated => "deprecated",
            TokenModifier::Readonly => "readonly",
            TokenModifier::DefaultLibrary => "default_library",
            TokenModifier::Async => "async",
            TokenModifier::Attribute => "attribute",
            TokenModifier::Callable => "callable",
            TokenModifier::Constant => "constant",
            TokenModifier::Consuming => "consuming",
            TokenModifier::ControlFlow => "controlFlow",
            TokenModifier::CrateRoot => "crateRoot",
            TokenModifier::Injected => "injected",
            TokenModifier::IntraDocLink => "intraDocLink",
            TokenModifier::Library => "library",
            TokenModifier::Mutable => "mutable",
            TokenModifier::Public => "public",
            TokenModifier::Reference => "reference",
            TokenModifier::Trait => "trait",
            TokenModifier::Unsafe => "unsafe",
        }
    }

    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Set of modifiers, encoded as the legend's bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);

    pub fn with(self, modifier: TokenModifier) -> Self {
        Modifiers(self.0 | modifier.bit())
    }

    pub fn contains(self, modifier: TokenModifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Modifiers in legend order.
    pub fn iter(self) -> impl Iterator<Item = TokenModifier> {
        TokenModifier::ALL
            .into_iter()
            .filter(move |modifier| self.contains(*modifier))
    }
}

impl From<TokenModifier> for Modifiers {
    fn from(modifier: TokenModifier) -> Self {
        Modifiers::NONE.with(modifier)
    }
}

impl FromIterator<TokenModifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = TokenModifier>>(iter: I) -> Self {
        iter.into_iter().fold(Modifiers::NONE, Modifiers::with)
    }
}

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TokenType::ALL
            .iter()
            .map(|kind| SemanticTokenType::new(kind.as_str()))
            .collect(),
        token_modifiers: TokenModifier::ALL
            .iter()
            .map(|modifier| SemanticTokenModifier::new(modifier.as_str()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_lists_every_type_and_modifier_in_order() {
        let legend = legend();
        assert_eq!(legend.token_types.len(), 21);
        assert_eq!(legend.token_modifiers.len(), 23);
        assert_eq!(legend.token_types[0].as_str(), "comment");
        assert_eq!(legend.token_types[12].as_str(), "typeParameter");
        assert_eq!(legend.token_types[20].as_str(), "unsupported");
        assert_eq!(legend.token_modifiers[7].as_str(), "default_library");
        assert_eq!(legend.token_modifiers[22].as_str(), "unsafe");
    }

    #[test]
    fn indices_match_positions() {
        for (position, kind) in TokenType::ALL.iter().enumerate() {
            assert_eq!(kind.index() as usize, position);
        }
        for (position, modifier) in TokenModifier::ALL.iter().enumerate() {
            assert_eq!(modifier.bit(), 1 << position);
        }
    }

    #[test]
    fn modifier_sets() {
        let set: Modifiers = [TokenModifier::Constant, TokenModifier::Declaration]
            .into_iter()
            .collect();
        assert_eq!(set.bits(), 0b1000_0000_0010);
        assert!(set.contains(TokenModifier::Declaration));
        assert!(!set.contains(TokenModifier::Readonly));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![TokenModifier::Declaration, TokenModifier::Constant]
        );
        assert!(Modifiers::NONE.is_empty());
    }
}
