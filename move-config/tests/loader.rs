use move_config::{load_defaults, ConfigError, LanguageError, Loader, Rgb, Scope, ThemeError};
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn user_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[rstest]
#[case::keyword("keyword.module", Some("569CD6"), false)]
#[case::longer_class("keyword.module.extra", Some("569CD6"), false)]
#[case::comment("comment", Some("6A9955"), true)]
#[case::last_module("namespace.lastModName", Some("569CD6"), true)]
#[case::lowercase_hex("abilities", Some("C44DFF"), false)]
#[case::fun_name("fun-name", Some("00FF99"), true)]
#[case::unregistered("keyword", Some("D4D4D4"), false)]
#[case::identifier("identifier", Some("D4D4D4"), false)]
fn default_theme_resolution(
    #[case] class: &str,
    #[case] foreground: Option<&str>,
    #[case] italic: bool,
) {
    let theme = load_defaults().unwrap().theme.compile().unwrap();
    let style = theme.resolve(class);
    assert_eq!(style.foreground, foreground.and_then(Rgb::parse), "{class}");
    assert_eq!(style.font_style.italic, italic, "{class}");
}

#[test]
fn default_editor_colours() {
    let theme = load_defaults().unwrap().theme.compile().unwrap();
    assert_eq!(theme.color("editor.background"), Rgb::parse("1E1E1E"));
    assert_eq!(theme.color("editorCursor.foreground"), Rgb::parse("AEAFAD"));
    assert_eq!(theme.base(), "vs-dark");
}

#[test]
fn user_file_overrides_defaults() {
    let file = user_file("[lexer]\nmax_stack_depth = 16\n\n[semantic]\nenabled = false\n");
    let config = Loader::new().with_file(file.path()).build().unwrap();
    assert_eq!(config.lexer.max_stack_depth, 16);
    assert!(!config.semantic.enabled);
    // untouched sections keep their defaults
    assert_eq!(config.theme.rules.len(), 22);
}

#[test]
fn user_theme_rules_replace_the_defaults() {
    let file = user_file(
        "[[theme.rules]]\ntoken = \"keyword\"\nforeground = \"#FF0000\"\nfont_style = \"bold underline\"\n",
    );
    let config = Loader::new().with_file(file.path()).build().unwrap();
    let theme = config.theme.compile().unwrap();
    let style = theme.resolve("keyword.module");
    assert_eq!(style.foreground, Rgb::parse("FF0000"));
    assert!(style.font_style.bold && style.font_style.underline);
    assert!(theme.rule_for("comment").is_none());
}

#[test]
fn invalid_theme_fails_at_build() {
    let file = user_file("[[theme.rules]]\ntoken = \"string\"\nforeground = \"brown\"\n");
    let err = Loader::new().with_file(file.path()).build().unwrap_err();
    match err {
        ConfigError::Theme(ThemeError::InvalidColor { value, .. }) => assert_eq!(value, "brown"),
        other => panic!("expected a theme error, got {other:?}"),
    }
}

#[test]
fn missing_required_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Loader::new()
        .with_file(dir.path().join("absent.toml"))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn missing_optional_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = Loader::new()
        .with_optional_file(dir.path().join("absent.toml"))
        .build()
        .unwrap();
    assert_eq!(config.lexer.max_stack_depth, 100);
}

#[test]
fn wrong_type_is_a_load_error() {
    let file = user_file("[lexer]\nmax_stack_depth = \"deep\"\n");
    let err = Loader::new().with_file(file.path()).build().unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[rstest]
#[case::bracket("[", Scope::Code, Some("]"))]
#[case::quote("\"", Scope::Code, Some("\""))]
#[case::quote_in_string("\"", Scope::String, None)]
#[case::quote_in_comment("\"", Scope::Comment, Some("\""))]
#[case::single_quote("'", Scope::Code, None)]
fn default_auto_closing_pairs(
    #[case] open: &str,
    #[case] scope: Scope,
    #[case] close: Option<&str>,
) {
    let language = load_defaults().unwrap().language.compile().unwrap();
    assert_eq!(language.auto_close(open, scope), close);
}

#[test]
fn default_language_configuration() {
    let language = load_defaults().unwrap().language.compile().unwrap();
    let config = language.config();
    assert_eq!(config.comments.block, ["/*".to_string(), "*/".to_string()]);
    assert_eq!(language.surround("'"), Some("'"));
    let lines = [
        "module demo {",
        "    #pragma region helpers",
        "    fun f() {}",
        "    #pragma endregion",
        "}",
    ];
    assert_eq!(language.folding_ranges(lines), vec![(1, 3)]);
}

#[test]
fn invalid_folding_marker_fails_at_build() {
    let file = user_file("[language.folding]\nstart = \"(\"\nend = \"x\"\n");
    let err = Loader::new().with_file(file.path()).build().unwrap_err();
    assert!(matches!(err, ConfigError::Language(LanguageError::FoldingMarker { .. })));
}
