//! The Move grammar
//!
//!     States, roughly in the order a module is read:
//!
//!         root            top level: annotations, `module`, `script { .. }`
//!         moduleName      `a::b::c` after `module`, then `{` or `;`
//!         moduleBody      declarations; `}` closes it only when the frame was opened by `{`
//!         useDecl         `use a::b::{..};`, with useBrace for nested item lists
//!         constDecl       `const NAME: Type = value;` via constType and constValue
//!         structHead      `struct Name<T> has abilities` up to `{`, `(` or `;`
//!         structBody      named fields (`field: Type`), enum variants
//!         fieldType       type of one field, ends at `,` or `}`
//!         positionalFields `(u64, T)` after a struct or variant name
//!         funName         name and generics of a function, up to `(`
//!         params          parameter list, one paramType per `name:`
//!         funSignature    return type (retType) and `acquires`, up to `{` or `;`
//!         generics        `<..>` in type position, one frame per `<`
//!         funBody, block  statements; nested `{` push another block
//!         string          string literal body; the frame parameter is the prefix (`b`, `x`)
//!         comment         nested block comments
//!
//!     The fragments `whitespace`, `typeCommon`, `expression` and `numbers` are only ever
//!     included into other states.

use crate::rules::{ActionDefinition as A, GrammarDefinition, RuleDefinition as R, RuleTable};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const KEYWORDS: &[&str] = &[
    "module", "struct", "enum", "resource", "fun", "public", "entry", "native", "inline", "macro",
    "friend", "package", "move", "copy", "const", "let", "mut", "if", "else", "return", "abort",
    "break", "continue", "true", "false", "script", "use", "as", "has", "acquires", "match",
    "while", "loop", "for", "in", "spec", "phantom", "Self",
];

pub const PRIMITIVES: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "u256", "address", "bool", "signer", "vector",
];

pub const CONSTANTS: &[&str] = &["true", "false", "Some", "None", "Left", "Right", "Ok", "Err"];

pub const ABILITIES: &[&str] = &["copy", "drop", "store", "key"];

pub const OPERATORS: &[&str] = &[
    "!", "!=", "%", "%=", "&", "&=", "&&", "*", "*=", "+", "+=", "-", "-=", "->", ".", "..",
    "...", "/", "/=", ":", "<<", "<<=", "<", "<=", "=", "==", "=>", ">", ">=", ">>", ">>=",
    "@", "^", "^=", "|", "|=", "||", "_", "?", "#",
];

static RULE_TABLE: Lazy<Arc<RuleTable>> = Lazy::new(|| {
    match RuleTable::compile(&definition()) {
        Ok(table) => Arc::new(table),
        Err(err) => panic!("built-in Move grammar does not compile: {err}"),
    }
});

/// The compiled Move rule table, shared by every tokenizer in the process.
pub fn rule_table() -> Arc<RuleTable> {
    RULE_TABLE.clone()
}

fn open(class: &str) -> A {
    A::token(class).open()
}

fn close(class: &str) -> A {
    A::token(class).close()
}

fn ident_cases<'a>(extra: &[(&'a str, &'a str)], fallback: &'a str) -> A {
    A::cases(
        extra
            .iter()
            .copied()
            .chain(std::iter::once(("@default", fallback))),
    )
}

/// Declarative definition of the Move grammar.
pub fn definition() -> GrammarDefinition {
    GrammarDefinition::new("move")
        .default_token("invalid")
        .macro_pattern("ident", r"[a-zA-Z_$][a-zA-Z0-9_$]*")
        .macro_pattern("path_segment", r"(?:0x[0-9a-fA-F_]+|@ident)::")
        .macro_pattern("annotation", r"#!?\[[^\]]*\]")
        .macro_pattern(
            "escapes",
            r#"\\(?:[nrt0"'\\]|x[0-9a-fA-F]{2}|u\{[0-9a-fA-F]{1,6}\})"#,
        )
        .macro_pattern(
            "symbols",
            r"(?:[#!%&*+\-.:<=>@^|?_]|/[#!%&+\-.:<=>@^|?_])+|/",
        )
        .macro_pattern("int_suffix", r"u(?:8|16|32|64|128|256)")
        .macro_pattern("float_suffix", r"f(?:32|64)")
        .class_set("keywords", KEYWORDS.iter().copied())
        .class_set("primitives", PRIMITIVES.iter().copied())
        .class_set("constants", CONSTANTS.iter().copied())
        .class_set("abilities", ABILITIES.iter().copied())
        .class_set("operators", OPERATORS.iter().copied())
        .bracket("{", "}", "delimiter.curly")
        .bracket("[", "]", "delimiter.square")
        .bracket("(", ")", "delimiter.parenthesis")
        .bracket("<", ">", "delimiter.angle")
        .state(
            "root",
            vec![
                R::new("@annotation", "annotation"),
                R::include("@whitespace"),
                R::new(r"module\b", A::token("keyword.module").next("@moduleName")),
                R::new(
                    r"(script)(\s*)(\{)",
                    A::groups([A::from("keyword"), A::from("white"), open("delimiter.curly")])
                        .next("@moduleBody")
                        .param("$3"),
                ),
                R::new(r"[{}]", "@brackets"),
                R::include("@expression"),
            ],
        )
        .state(
            "moduleName",
            vec![
                R::include("@whitespace"),
                R::new("@path_segment", "namespace.lending"),
                R::new("@ident", "namespace.lastModName"),
                R::new(
                    r"\{",
                    open("delimiter.curly").next("=moduleBody").param("$0"),
                ),
                R::new(";", A::token("delimiter").next("=moduleBody").param("$0")),
                R::epsilon_pop(),
            ],
        )
        .state(
            "moduleBody",
            vec![
                R::include("@whitespace"),
                R::new("@annotation", "annotation"),
                R::new(
                    r"\}",
                    A::cases([
                        ("$P=={", close("delimiter.curly").next("@pop")),
                        ("@default", A::from("invalid")),
                    ]),
                ),
                R::new(r"\{", open("delimiter.curly").next("@block").param("$0")),
                R::new(r"(?:use|friend)\b", A::token("keyword.use").next("@useDecl")),
                R::new(r"const\b", A::token("keyword.const").next("@constDecl")),
                R::new(
                    r"public\b(?:\s*\(\s*(?:package|friend|script)\s*\))?",
                    "visibility",
                ),
                R::new(r"(?:struct|enum)\b", A::token("keyword.struct").next("@structHead")),
                R::new(r"fun\b", A::token("keyword.fun").next("@funName")),
                R::include("@expression"),
            ],
        )
        .state(
            "useDecl",
            vec![
                R::include("@whitespace"),
                R::new("@path_segment", "namespace"),
                R::new(r"\{", open("delimiter.curly").next("@useBrace")),
                R::new(r"fun\b", "keyword.fun"),
                R::new(r"\.", "operator"),
                R::new(
                    "@ident",
                    ident_cases(&[("Self", "keyword"), ("as", "keyword")], "type.use.item.identifier"),
                ),
                R::new(",", "delimiter"),
                R::new(";", A::token("delimiter").next("@pop")),
                R::epsilon_pop(),
            ],
        )
        .state(
            "useBrace",
            vec![
                R::include("@whitespace"),
                R::new(r"\}", close("delimiter.curly").next("@pop")),
                R::new(r"\{", open("delimiter.curly").next("@push")),
                R::new("@path_segment", "namespace"),
                R::new(
                    "@ident",
                    ident_cases(
                        &[("Self", "keyword"), ("as", "keyword")],
                        "type.use_brace.item.identifier",
                    ),
                ),
                R::new(",", "delimiter"),
                R::epsilon_pop(),
            ],
        )
        .state(
            "constDecl",
            vec![
                R::include("@whitespace"),
                R::new(":", A::token("delimiter").next("@constType")),
                R::new("=", A::token("operator").next("=constValue")),
                R::new("@ident", "identifier.constant"),
                R::epsilon_pop(),
            ],
        )
        .state(
            "constType",
            vec![
                R::include("@whitespace"),
                R::include("@typeCommon"),
                R::new("@ident", ident_cases(&[("@primitives", "type.primitive")], "type.identifier")),
                R::epsilon_pop(),
            ],
        )
        .state(
            "constValue",
            vec![
                R::include("@whitespace"),
                R::new(";", A::token("delimiter").next("@pop")),
                R::include("@expression"),
            ],
        )
        .state(
            "structHead",
            vec![
                R::include("@whitespace"),
                R::new("<", open("delimiter.angle").next("@generics").param("$0")),
                R::new(r"\{", open("delimiter.curly").next("=structBody").param("$0")),
                R::new(r"\(", open("delimiter.parenthesis").next("@positionalFields")),
                R::new(";", A::token("delimiter").next("@pop")),
                R::new(",", "delimiter"),
                R::new(
                    "@ident",
                    ident_cases(
                        &[("has", "keyword"), ("phantom", "keyword"), ("@abilities", "abilities")],
                        "type.struct.identifier",
                    ),
                ),
                R::epsilon_pop(),
            ],
        )
        .state(
            "structBody",
            vec![
                R::include("@whitespace"),
                R::new("@annotation", "annotation"),
                R::new(r"\}", close("delimiter.curly").next("@pop")),
                R::new(
                    r"(@ident)(\s*)(:)",
                    A::groups(["property", "white", "delimiter"]).next("@fieldType"),
                ),
                R::new(r"\{", open("delimiter.curly").next("@structBody").param("$0")),
                R::new(r"\(", open("delimiter.parenthesis").next("@positionalFields")),
                R::new(",", "delimiter"),
                R::new("@ident", "type.struct.identifier"),
            ],
        )
        .state(
            "fieldType",
            vec![
                R::include("@whitespace"),
                R::include("@typeCommon"),
                R::new(
                    "@ident",
                    ident_cases(
                        &[("@primitives", "type.primitive")],
                        "type.identifier.struct_field_ty",
                    ),
                ),
                R::epsilon_pop(),
            ],
        )
        .state(
            "positionalFields",
            vec![
                R::include("@whitespace"),
                R::new(r"\)", close("delimiter.parenthesis").next("@pop")),
                R::new(",", "delimiter"),
                R::include("@typeCommon"),
                R::new("@ident", ident_cases(&[("@primitives", "type.primitive")], "type.identifier")),
                R::epsilon_pop(),
            ],
        )
        .state(
            "funName",
            vec![
                R::include("@whitespace"),
                R::new("<", open("delimiter.angle").next("@generics").param("$0")),
                R::new(r"\(", open("delimiter.parenthesis").next("=params")),
                R::new("@ident", "fun-name"),
                R::epsilon_pop(),
            ],
        )
        .state(
            "params",
            vec![
                R::include("@whitespace"),
                R::new(r"\)", close("delimiter.parenthesis").next("=funSignature")),
                R::new(r"mut\b", "keyword"),
                R::new(
                    r"(@ident)(\s*)(:)",
                    A::groups(["para-name", "white", "delimiter"]).next("@paramType"),
                ),
                R::new(",", "delimiter"),
                R::new("@ident", "para-name"),
                R::epsilon_pop(),
            ],
        )
        .state(
            "paramType",
            vec![
                R::include("@whitespace"),
                R::include("@typeCommon"),
                R::new("@ident", ident_cases(&[("@primitives", "type.primitive")], "para-type")),
                R::epsilon_pop(),
            ],
        )
        .state(
            "funSignature",
            vec![
                R::include("@whitespace"),
                R::new(":", A::token("delimiter").next("@retType")),
                R::new(r"acquires\b", "keyword"),
                R::new(r"\{", open("delimiter.curly").next("=funBody").param("$0")),
                R::new(";", A::token("delimiter").next("@pop")),
                R::new(",", "delimiter"),
                R::new("@ident", "type.identifier"),
                R::epsilon_pop(),
            ],
        )
        .state(
            "retType",
            vec![
                R::include("@whitespace"),
                R::new(r"[()]", "@brackets"),
                R::new(",", "delimiter"),
                R::include("@typeCommon"),
                R::new(
                    "@ident",
                    A::cases([
                        ("acquires", A::token("keyword").next("@pop")),
                        ("@primitives", A::from("type.primitive")),
                        ("@default", A::from("fun-ret-type")),
                    ]),
                ),
                R::epsilon_pop(),
            ],
        )
        .state(
            "generics",
            vec![
                R::include("@whitespace"),
                R::new(">", close("delimiter.angle").next("@pop")),
                R::new(",", "delimiter"),
                R::new(":", "delimiter"),
                R::new(r"\+", "operator"),
                R::include("@typeCommon"),
                R::new(
                    "@ident",
                    ident_cases(
                        &[
                            ("phantom", "keyword"),
                            ("@abilities", "abilities"),
                            ("@primitives", "type.primitive"),
                        ],
                        "type.generic",
                    ),
                ),
                R::epsilon_pop(),
            ],
        )
        .state("funBody", block_rules())
        .state("block", block_rules())
        .state(
            "typeCommon",
            vec![
                R::new("@path_segment", "namespace"),
                R::new("&", "operator"),
                R::new(r"mut\b", "keyword"),
                R::new("<", open("delimiter.angle").next("@generics").param("$0")),
            ],
        )
        .state(
            "expression",
            vec![
                R::new(r#"[bx]?"(?:[^"\\]|\\.)*\\?$"#, "string.invalid"),
                R::new(r#"([bx]?)""#, open("string.quote").next("@string").param("$1")),
                R::new(r"@(?:0x[0-9a-fA-F_]+|[0-9]+|@ident)", "number.address"),
                R::include("@numbers"),
                R::new("@path_segment", "namespace"),
                R::new(
                    r"([A-Z][a-zA-Z0-9_]*|vector|borrow_global_mut|borrow_global|exists|move_from|move_to)(<)",
                    A::groups([
                        ident_cases(&[("@primitives", "type.primitive"), ("~[A-Z].*", "type.identifier")], "function.call"),
                        open("delimiter.angle"),
                    ])
                    .next("@generics")
                    .param("$2"),
                ),
                R::new(
                    r"(@ident)(!?)(\s*)(\()",
                    A::groups([
                        ident_cases(&[("@keywords", "keyword"), ("@primitives", "type.primitive")], "function.call"),
                        A::from("function.call"),
                        A::from("white"),
                        open("delimiter.parenthesis"),
                    ]),
                ),
                R::new(
                    "@ident",
                    ident_cases(
                        &[
                            ("@primitives", "type.primitive"),
                            ("@keywords", "keyword"),
                            ("@constants", "constant"),
                            ("~[A-Z].*", "type.identifier"),
                        ],
                        "identifier",
                    ),
                ),
                R::new(r"[()\[\]]", "@brackets"),
                R::new(",", "delimiter"),
                R::new(";", "delimiter"),
                R::new(r"'(?:@escapes|\S)'", "string.byteliteral"),
                R::new("'@ident", "label"),
                R::new("@symbols", ident_cases(&[("@operators", "operator")], "symbol")),
            ],
        )
        .state(
            "numbers",
            vec![
                R::new(r"0o[0-7_]+(?:@int_suffix)?", "number.octal"),
                R::new(r"0b[01_]+(?:@int_suffix)?", "number.binary"),
                R::new(r"0x[0-9a-fA-F_]+(?:@int_suffix)?", "number.hex"),
                R::new(
                    r"[0-9][0-9_]*(?:\.[0-9][0-9_]*)?[eE][+-]?[0-9_]+(?:@float_suffix)?",
                    "number.float",
                ),
                R::new(r"[0-9][0-9_]*(?:\.[0-9][0-9_]*)?(?:@int_suffix|@float_suffix)?", "number"),
            ],
        )
        .state(
            "string",
            vec![
                R::new(
                    r#"[^\\"]+"#,
                    A::cases([("$P==x", "string.hex"), ("@default", "string")]),
                ),
                R::new("@escapes", "string.escape"),
                R::new(r"\\.", "string.escape.invalid"),
                R::new(r#"""#, close("string.quote").next("@pop")),
            ],
        )
        .state(
            "whitespace",
            vec![
                R::new(r"[ \t\r\n]+", "white"),
                R::new(r"///.*$", "comment.doc"),
                R::new(r"//.*$", "comment"),
                R::new(r"/\*", A::token("comment").next("@comment")),
            ],
        )
        .state(
            "comment",
            vec![
                R::new(r"[^/*]+", "comment"),
                R::new(r"/\*", A::token("comment").next("@push")),
                R::new(r"\*/", A::token("comment").next("@pop")),
                R::new(r"[/*]", "comment"),
            ],
        )
}

fn block_rules() -> Vec<R> {
    vec![
        R::include("@whitespace"),
        R::new(
            r"\}",
            A::cases([
                ("$P=={", close("delimiter.curly").next("@pop")),
                ("@default", A::from("invalid")),
            ]),
        ),
        R::new(r"\{", open("delimiter.curly").next("@block").param("$0")),
        R::include("@expression"),
    ]
}
