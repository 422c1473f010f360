use move_lexer::testing::check_tiles;
use move_lexer::{move_lang, LineDriver, StateStack, Tokenizer};
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "module m {",
    "module a::b;",
    "}",
    "{",
    "fun f<T: copy>(x: &mut T): T {",
    "struct S has key {",
    "x: vector<u8>,",
    "/*",
    "*/",
    "//",
    "\"",
    "b\"",
    "x\"",
    "\\",
    "0x1F_u64",
    "@0x1",
    "<",
    ">",
    ">>",
    "(",
    ")",
    "use a::b::{Self, C};",
    "const C: u8 = 1;",
    "#[test]",
    "script {",
    " ",
    "\t",
    "é",
    "🦀",
];

/// Lines that leave the tokenizer in a variety of nested states.
const OPENERS: &[&str] = &[
    "",
    "module m {",
    "module m { fun f(",
    "module m { fun f(x: vector<",
    "module m { public struct S {",
    "module m { struct S { f: Table<u64,",
    "module m { fun f() { if (x) {",
    "module m { use a::{",
    "module m { const C:",
    "/* /* nested",
    "module m { let s = b\"",
    "module x;",
];

fn line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,40}",
        "\\PC{0,20}",
        prop::collection::vec(prop::sample::select(FRAGMENTS), 0..10).prop_map(|parts| parts.concat()),
    ]
}

fn start_state() -> impl Strategy<Value = StateStack> {
    prop::sample::select(OPENERS).prop_map(|opener| {
        tokenizer()
            .tokenize_line(&StateStack::root(), opener)
            .end_state
    })
}

fn tokenizer() -> Tokenizer {
    Tokenizer::new(move_lang::rule_table())
}

proptest! {
    #[test]
    fn tokens_tile_every_line(stack in start_state(), line in line()) {
        let out = tokenizer().tokenize_line(&stack, &line);
        if let Err(message) = check_tiles(&line, &out.tokens) {
            return Err(TestCaseError::fail(message));
        }
    }

    #[test]
    fn tokenizing_is_deterministic(stack in start_state(), line in line()) {
        let tokenizer = tokenizer();
        prop_assert_eq!(
            tokenizer.tokenize_line(&stack, &line),
            tokenizer.tokenize_line(&stack, &line)
        );
    }

    #[test]
    fn end_state_keeps_root_and_respects_the_depth_limit(
        stack in start_state(),
        line in line(),
        limit in 1usize..8,
    ) {
        let tokenizer = tokenizer().with_max_stack_depth(limit.max(stack.depth()));
        let out = tokenizer.tokenize_line(&stack, &line);
        prop_assert!(out.end_state.depth() >= 1);
        prop_assert!(out.end_state.depth() <= tokenizer.max_stack_depth());
        prop_assert_eq!(out.end_state.frames()[0].clone(), StateStack::root().top().clone());
    }

    #[test]
    fn incremental_relex_matches_a_full_relex(
        document in prop::collection::vec(line(), 1..12),
        edit_at in any::<prop::sample::Index>(),
        replacement in line(),
    ) {
        let mut lines = document;
        let mut incremental = LineDriver::for_table(move_lang::rule_table());
        incremental.load(&lines);

        let index = edit_at.index(lines.len());
        lines[index] = replacement;
        incremental.relex(&lines, index);

        let mut full = LineDriver::for_table(move_lang::rule_table());
        full.load(&lines);
        for line in 0..lines.len() {
            prop_assert_eq!(incremental.cached(line), full.cached(line));
        }
    }

    #[test]
    fn inserting_lines_matches_a_full_relex(
        document in prop::collection::vec(line(), 0..10),
        at in any::<prop::sample::Index>(),
        inserted in prop::collection::vec(line(), 0..4),
    ) {
        let mut lines = document;
        let mut incremental = LineDriver::for_table(move_lang::rule_table());
        incremental.load(&lines);

        let at = at.index(lines.len() + 1);
        let count = inserted.len();
        lines.splice(at..at, inserted);
        incremental.apply_edit(&lines, at, 0, count);

        let mut full = LineDriver::for_table(move_lang::rule_table());
        full.load(&lines);
        prop_assert_eq!(incremental.line_count(), lines.len());
        for line in 0..lines.len() {
            prop_assert_eq!(incremental.cached(line), full.cached(line));
        }
    }
}
