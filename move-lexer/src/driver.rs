//! Incremental re-lexing
//!
//!     `LineDriver` keeps, for every line of a document, the tokens of that line and the state
//!     it ends in. After an edit, only lines from the first dirty line onwards are re-lexed, and
//!     propagation stops at the first line past the edit whose end state is unchanged: from
//!     there on, every later line would be re-lexed from the same state into the same tokens.
//!
//!     The usual flow for an editor is:
//!
//!         driver.apply_edit(&lines, start, removed, inserted)   // structural edit
//!         driver.relex(&lines, line)                            // in-place change of one line
//!
//!     `relex_with` takes a predicate consulted between lines. When it returns false the pass
//!     is abandoned, the line it stopped at loses its cache entry, and the next pass resumes
//!     from there. Lines already re-lexed keep their results; nothing is merged from a pass
//!     that did not finish.

use crate::engine::{LineTokens, Tokenizer};
use crate::rules::RuleTable;
use crate::state::StateStack;
use crate::token::Token;
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub tokens: Vec<Token>,
    pub end_state: StateStack,
}

/// What a relex pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelexReport {
    /// First line that was re-lexed.
    pub first_line: usize,
    pub lines_relexed: usize,
    /// The pass stopped before the end of the document because an end state converged.
    pub stopped_early: bool,
    /// The pass was abandoned before this line.
    pub interrupted_at: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct LineDriver {
    tokenizer: Tokenizer,
    lines: Vec<Option<CacheEntry>>,
}

impl LineDriver {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            lines: Vec::new(),
        }
    }

    pub fn for_table(table: Arc<RuleTable>) -> Self {
        Self::new(Tokenizer::new(table))
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn tokens(&self, line: usize) -> Option<&[Token]> {
        self.cached(line).map(|cached| cached.tokens.as_slice())
    }

    pub fn end_state(&self, line: usize) -> Option<&StateStack> {
        self.cached(line).map(|cached| &cached.end_state)
    }

    pub fn cached(&self, line: usize) -> Option<&CacheEntry> {
        self.lines.get(line).and_then(Option::as_ref)
    }

    /// End state of the last line, or `root` for an empty document.
    pub fn document_end_state(&self) -> StateStack {
        self.lines
            .last()
            .and_then(Option::as_ref)
            .map(|cached| cached.end_state.clone())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Tokenizes a whole document from scratch.
    pub fn load<S: AsRef<str>>(&mut self, lines: &[S]) -> RelexReport {
        self.lines.clear();
        self.relex(lines, 0)
    }

    /// Re-lexes after line `dirty_from` changed in place.
    pub fn relex<S: AsRef<str>>(&mut self, lines: &[S], dirty_from: usize) -> RelexReport {
        self.relex_range(lines, dirty_from..dirty_from + 1, || true)
    }

    /// Like [`relex`](Self::relex), consulting `should_continue` before each line after the
    /// first.
    pub fn relex_with<S, F>(&mut self, lines: &[S], dirty_from: usize, should_continue: F) -> RelexReport
    where
        S: AsRef<str>,
        F: FnMut() -> bool,
    {
        self.relex_range(lines, dirty_from..dirty_from + 1, should_continue)
    }

    /// Replaces `removed` lines at `start` with `inserted` new ones and re-lexes.
    ///
    /// `lines` is the document after the edit.
    pub fn apply_edit<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        start: usize,
        removed: usize,
        inserted: usize,
    ) -> RelexReport {
        let start = start.min(self.lines.len());
        let end = (start + removed).min(self.lines.len());
        self.lines
            .splice(start..end, std::iter::repeat(None).take(inserted));
        self.relex_range(lines, start..start + inserted.max(1), || true)
    }

    /// Re-lexes lines from `dirty.start`, never stopping early before `dirty.end` or before
    /// a line left uncached by an earlier pass.
    pub fn relex_range<S, F>(
        &mut self,
        lines: &[S],
        dirty: Range<usize>,
        mut should_continue: F,
    ) -> RelexReport
    where
        S: AsRef<str>,
        F: FnMut() -> bool,
    {
        self.lines.resize(lines.len(), None);
        let mut report = RelexReport::default();
        if dirty.start >= lines.len() {
            report.first_line = lines.len();
            return report;
        }

        // A line can only be lexed once the line before it has an end state, and the cache is
        // only consistent again once every gap has been filled.
        let start = match self.lines.iter().position(Option::is_none) {
            Some(gap) if gap < dirty.start => gap,
            _ => dirty.start,
        };
        let settle_from = match self.lines.iter().rposition(Option::is_none) {
            Some(gap) => dirty.end.max(gap + 1),
            None => dirty.end,
        };
        report.first_line = start;

        let mut state = match start.checked_sub(1) {
            Some(previous) => self
                .end_state(previous)
                .cloned()
                .unwrap_or_default(),
            None => StateStack::root(),
        };

        for (index, line) in lines.iter().enumerate().skip(start) {
            if index > start && !should_continue() {
                self.lines[index] = None;
                report.interrupted_at = Some(index);
                tracing::debug!(line = index, "relex interrupted");
                return report;
            }

            let LineTokens { tokens, end_state } =
                self.tokenizer.tokenize_line(&state, line.as_ref());
            let converged = matches!(
                &self.lines[index],
                Some(previous) if previous.end_state == end_state
            );
            report.lines_relexed += 1;
            self.lines[index] = Some(CacheEntry {
                tokens,
                end_state: end_state.clone(),
            });

            if converged && index + 1 >= settle_from {
                report.stopped_early = index + 1 < lines.len();
                break;
            }
            state = end_state;
        }

        tracing::trace!(
            first_line = report.first_line,
            lines_relexed = report.lines_relexed,
            stopped_early = report.stopped_early,
            "relex pass finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ActionDefinition as A, GrammarDefinition, RuleDefinition as R};

    fn driver() -> LineDriver {
        let definition = GrammarDefinition::new("t")
            .state(
                "root",
                vec![
                    R::new(r"/\*", A::token("comment").next("@comment")),
                    R::new(r"[a-z]+", "word"),
                    R::new(r"\s+", "white"),
                ],
            )
            .state(
                "comment",
                vec![
                    R::new(r"\*/", A::token("comment").next("@pop")),
                    R::new(r"[^*]+|\*", "comment"),
                ],
            );
        LineDriver::for_table(Arc::new(RuleTable::compile(&definition).unwrap()))
    }

    #[test]
    fn edit_without_state_change_relexes_one_line() {
        let mut driver = driver();
        let mut lines = vec!["one", "two", "three", "four"];
        driver.load(&lines);
        lines[1] = "changed";
        let report = driver.relex(&lines, 1);
        assert_eq!(report.first_line, 1);
        assert_eq!(report.lines_relexed, 1);
        assert!(report.stopped_early);
    }

    #[test]
    fn opening_comment_propagates_to_the_end() {
        let mut driver = driver();
        let mut lines = vec!["one", "two", "three", "four"];
        driver.load(&lines);
        lines[1] = "/* two";
        let report = driver.relex(&lines, 1);
        assert_eq!(report.lines_relexed, 3);
        assert!(!report.stopped_early);
        assert_eq!(driver.tokens(3).unwrap()[0].class(), "comment");
        assert_eq!(driver.document_end_state().depth(), 2);
    }

    #[test]
    fn closing_comment_stops_once_states_converge() {
        let mut driver = driver();
        let mut lines = vec!["/* a", "b", "c */", "d", "e"];
        driver.load(&lines);
        lines[1] = "*/ b";
        let report = driver.relex(&lines, 1);
        // line 2 ends in root as before; its "*/" is now stray text
        assert_eq!(report.first_line, 1);
        assert_eq!(report.lines_relexed, 2);
        assert!(report.stopped_early);
        assert_eq!(driver.end_state(2).unwrap(), &StateStack::root());
    }

    #[test]
    fn relex_is_idempotent() {
        let mut driver = driver();
        let lines = vec!["/* a", "b */ c", "d"];
        driver.load(&lines);
        let before: Vec<_> = (0..3).map(|i| driver.cached(i).cloned()).collect();
        let report = driver.relex(&lines, 0);
        let after: Vec<_> = (0..3).map(|i| driver.cached(i).cloned()).collect();
        assert_eq!(before, after);
        assert_eq!(report.lines_relexed, 1);
    }

    #[test]
    fn inserted_lines_are_lexed_and_propagate() {
        let mut driver = driver();
        let lines = vec!["a", "b"];
        driver.load(&lines);
        let lines = vec!["a", "/* x", "y", "b"];
        let report = driver.apply_edit(&lines, 1, 0, 2);
        assert_eq!(driver.line_count(), 4);
        assert_eq!(report.first_line, 1);
        assert_eq!(report.lines_relexed, 3);
        assert_eq!(driver.tokens(3).unwrap()[0].class(), "comment");
    }

    #[test]
    fn removed_lines_relex_the_following_line() {
        let mut driver = driver();
        let lines = vec!["a", "/* x", "y", "b"];
        driver.load(&lines);
        let lines = vec!["a", "b"];
        let report = driver.apply_edit(&lines, 1, 2, 0);
        assert_eq!(driver.line_count(), 2);
        assert_eq!(report.lines_relexed, 1);
        assert_eq!(driver.tokens(1).unwrap()[0].class(), "word");
        assert!(driver.document_end_state().is_root());
    }

    #[test]
    fn interrupted_pass_resumes_where_it_stopped() {
        let mut driver = driver();
        let mut lines = vec!["a", "b", "c", "d"];
        driver.load(&lines);
        lines[0] = "/* a";
        let mut budget = 1;
        let report = driver.relex_with(&lines, 0, || {
            budget -= 1;
            budget >= 0
        });
        assert_eq!(report.interrupted_at, Some(2));
        assert!(driver.cached(2).is_none());

        let resumed = driver.relex(&lines, 3);
        assert_eq!(resumed.first_line, 2);
        assert!(driver.tokens(3).unwrap().iter().all(|t| t.class() == "comment"));
    }

    #[test]
    fn pass_above_a_gap_does_not_stop_before_it() {
        let mut driver = driver();
        let mut lines = vec!["a", "b", "c", "d"];
        driver.load(&lines);
        lines[1] = "/* b";
        let report = driver.relex_with(&lines, 1, || false);
        assert_eq!(report.interrupted_at, Some(2));

        // line 0 converges at once, but line 2 still has to be filled in
        let report = driver.relex(&lines, 0);
        assert_eq!(report.lines_relexed, 4);
        assert!(driver.cached(2).is_some());
        assert_eq!(driver.tokens(3).unwrap()[0].class(), "comment");
    }

    #[test]
    fn dirty_line_past_the_end_does_nothing() {
        let mut driver = driver();
        let report = driver.relex(&["a"], 5);
        assert_eq!(report.lines_relexed, 0);
        assert_eq!(driver.line_count(), 1);
    }
}
