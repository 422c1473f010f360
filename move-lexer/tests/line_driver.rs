//! Whole-document behaviour of the line driver over Move sources.

use move_lexer::testing::check_tiles;
use move_lexer::{move_lang, LineDriver, StateStack};
use rstest::rstest;
use std::path::PathBuf;

fn sample(name: &str) -> Vec<String> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("samples")
        .join(name);
    let source = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("cannot read {}: {err}", path.display()));
    source.lines().map(str::to_string).collect()
}

fn driver() -> LineDriver {
    LineDriver::for_table(move_lang::rule_table())
}

fn snapshot(driver: &LineDriver) -> Vec<Option<move_lexer::CacheEntry>> {
    (0..driver.line_count())
        .map(|line| driver.cached(line).cloned())
        .collect()
}

#[rstest]
#[case("identified_payment.move")]
#[case("shapes.move")]
fn balanced_documents_end_at_root(#[case] name: &str) {
    let lines = sample(name);
    let mut driver = driver();
    let report = driver.load(&lines);
    assert_eq!(report.lines_relexed, lines.len());
    assert!(!report.stopped_early);
    for (index, line) in lines.iter().enumerate() {
        let tokens = driver.tokens(index).expect("every line is cached after load");
        if let Err(message) = check_tiles(line, tokens) {
            panic!("line {}: {message}", index + 1);
        }
    }
    assert_eq!(driver.document_end_state(), StateStack::root());
}

#[test]
fn well_formed_sample_has_no_invalid_tokens() {
    let lines = sample("shapes.move");
    let mut driver = driver();
    driver.load(&lines);
    for (index, line) in lines.iter().enumerate() {
        for token in driver.tokens(index).unwrap() {
            assert_ne!(
                token.class(),
                "invalid",
                "line {}: {:?}",
                index + 1,
                token.text(line)
            );
        }
    }
}

#[test]
fn editing_inside_a_function_relexes_one_line() {
    let mut lines = sample("shapes.move");
    let mut driver = driver();
    driver.load(&lines);
    let target = lines
        .iter()
        .position(|line| line.trim_start().starts_with("let v ="))
        .unwrap();
    let before = snapshot(&driver);

    lines[target] = "        let v = vector[];".to_string();
    let report = driver.relex(&lines, target);

    assert_eq!(report.first_line, target);
    assert_eq!(report.lines_relexed, 1);
    assert!(report.stopped_early);
    let after = snapshot(&driver);
    for (index, (old, new)) in before.iter().zip(&after).enumerate() {
        if index != target {
            assert_eq!(old, new, "line {index} changed");
        }
    }
}

#[test]
fn opening_a_comment_reaches_the_end_and_closing_it_restores() {
    let mut lines = sample("identified_payment.move");
    let mut driver = driver();
    driver.load(&lines);
    let pristine = snapshot(&driver);

    let original = lines[13].clone();
    lines[13] = format!("/* {original}");
    let report = driver.relex(&lines, 13);
    assert_eq!(report.lines_relexed, lines.len() - 13);
    assert!(!report.stopped_early);
    assert_eq!(
        driver.document_end_state().describe(&move_lang::rule_table()),
        "root/moduleBody({)/comment"
    );

    lines[13] = original;
    let report = driver.relex(&lines, 13);
    assert_eq!(report.lines_relexed, lines.len() - 13);
    assert_eq!(snapshot(&driver), pristine);
}

#[test]
fn relexing_unchanged_text_changes_nothing() {
    let lines = sample("identified_payment.move");
    let mut driver = driver();
    driver.load(&lines);
    let before = snapshot(&driver);
    for line in [0, 20, 60, lines.len() - 1] {
        let report = driver.relex(&lines, line);
        assert_eq!(report.lines_relexed, 1);
    }
    assert_eq!(snapshot(&driver), before);
}

#[test]
fn deleting_a_closing_brace_leaves_the_module_open() {
    let mut lines = sample("shapes.move");
    let mut driver = driver();
    driver.load(&lines);
    let close = lines.iter().rposition(|line| line == "}").unwrap();
    lines.remove(close);
    driver.apply_edit(&lines, close, 1, 0);
    assert_eq!(driver.line_count(), lines.len());
    assert!(!driver.document_end_state().is_root());

    let mut fresh = self::driver();
    fresh.load(&lines);
    assert_eq!(snapshot(&driver), snapshot(&fresh));
}

#[test]
fn pasted_lines_match_a_full_relex() {
    let mut lines = sample("identified_payment.move");
    let mut driver = driver();
    driver.load(&lines);
    let pasted = [
        "    public fun zero(): u64 {",
        "        0",
        "    }",
        "",
    ];
    let at = 13;
    for (offset, line) in pasted.iter().enumerate() {
        lines.insert(at + offset, line.to_string());
    }
    let report = driver.apply_edit(&lines, at, 0, pasted.len());
    assert_eq!(report.first_line, at);
    assert!(report.stopped_early);

    let mut fresh = self::driver();
    fresh.load(&lines);
    assert_eq!(snapshot(&driver), snapshot(&fresh));
}

#[test]
fn interrupted_pass_is_finished_by_the_next_one() {
    let mut lines = sample("shapes.move");
    let mut driver = driver();
    driver.load(&lines);
    lines[0] = "module broken {".to_string();

    let mut budget = 3;
    let report = driver.relex_with(&lines, 0, || {
        budget -= 1;
        budget >= 0
    });
    assert_eq!(report.interrupted_at, Some(4));
    assert!(driver.cached(4).is_none());

    driver.relex(&lines, 0);
    let mut fresh = self::driver();
    fresh.load(&lines);
    assert_eq!(snapshot(&driver), snapshot(&fresh));
}
