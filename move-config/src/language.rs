//! Editor language configuration
//!
//! Everything an editor needs besides the tokenizer to treat a buffer as Move: comment
//! markers, bracket pairs, pairs to auto-close and to surround a selection with, and the
//! `#pragma region` folding markers. [`LanguageConfig`] is the data as configured;
//! [`LanguageConfig::compile`] checks it and compiles the folding markers.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Scopes an auto-closing pair can be suppressed in.
pub const SCOPES: &[&str] = &["string", "comment"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LanguageConfig {
    pub comments: Comments,
    #[serde(default)]
    pub brackets: Vec<[String; 2]>,
    #[serde(default)]
    pub auto_closing_pairs: Vec<AutoClosingPair>,
    #[serde(default)]
    pub surrounding_pairs: Vec<Pair>,
    pub folding: Folding,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Comments {
    pub line: String,
    pub block: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pair {
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AutoClosingPair {
    pub open: String,
    pub close: String,
    /// Scopes (from [`SCOPES`]) in which typing `open` inserts nothing.
    #[serde(default)]
    pub not_in: Vec<String>,
}

/// Line patterns that start and end a foldable region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Folding {
    pub start: String,
    pub end: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    #[error("{context} has an empty delimiter")]
    EmptyDelimiter { context: &'static str },
    #[error("unknown scope {scope:?} for auto-closing pair {open:?}")]
    UnknownScope { open: String, scope: String },
    #[error("invalid folding marker {pattern:?}: {source}")]
    FoldingMarker {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Where the cursor sits when a pair is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Code,
    String,
    Comment,
}

impl Scope {
    fn name(self) -> &'static str {
        match self {
            Scope::Code => "code",
            Scope::String => "string",
            Scope::Comment => "comment",
        }
    }

    /// The scope a token of `class` puts the cursor in.
    pub fn of_class(class: &str) -> Self {
        let head = class.split('.').next().unwrap_or_default();
        match head {
            "string" => Scope::String,
            "comment" => Scope::Comment,
            _ => Scope::Code,
        }
    }
}

impl LanguageConfig {
    pub fn compile(&self) -> Result<Language, LanguageError> {
        let delimiters = [
            ("comments.line", self.comments.line.as_str()),
            ("comments.block", self.comments.block[0].as_str()),
            ("comments.block", self.comments.block[1].as_str()),
        ];
        let brackets = self
            .brackets
            .iter()
            .flat_map(|[open, close]| [("brackets", open.as_str()), ("brackets", close.as_str())]);
        let auto = self.auto_closing_pairs.iter().flat_map(|pair| {
            [
                ("auto_closing_pairs", pair.open.as_str()),
                ("auto_closing_pairs", pair.close.as_str()),
            ]
        });
        let surrounding = self.surrounding_pairs.iter().flat_map(|pair| {
            [
                ("surrounding_pairs", pair.open.as_str()),
                ("surrounding_pairs", pair.close.as_str()),
            ]
        });
        if let Some((context, _)) = delimiters
            .into_iter()
            .chain(brackets)
            .chain(auto)
            .chain(surrounding)
            .find(|(_, text)| text.is_empty())
        {
            return Err(LanguageError::EmptyDelimiter { context });
        }

        for pair in &self.auto_closing_pairs {
            if let Some(scope) = pair.not_in.iter().find(|scope| !SCOPES.contains(&scope.as_str())) {
                return Err(LanguageError::UnknownScope {
                    open: pair.open.clone(),
                    scope: scope.clone(),
                });
            }
        }

        let marker = |pattern: &str| {
            Regex::new(pattern).map_err(|source| LanguageError::FoldingMarker {
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(Language {
            config: self.clone(),
            folding_start: marker(&self.folding.start)?,
            folding_end: marker(&self.folding.end)?,
        })
    }
}

/// A checked language configuration.
#[derive(Debug, Clone)]
pub struct Language {
    config: LanguageConfig,
    folding_start: Regex,
    folding_end: Regex,
}

impl Language {
    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    pub fn starts_region(&self, line: &str) -> bool {
        self.folding_start.is_match(line)
    }

    pub fn ends_region(&self, line: &str) -> bool {
        self.folding_end.is_match(line)
    }

    /// The text to insert after `open` is typed in `scope`, if any.
    pub fn auto_close(&self, open: &str, scope: Scope) -> Option<&str> {
        self.config
            .auto_closing_pairs
            .iter()
            .find(|pair| pair.open == open)
            .filter(|pair| !pair.not_in.iter().any(|name| name == scope.name()))
            .map(|pair| pair.close.as_str())
    }

    /// The closing half when a selection is wrapped with `open`.
    pub fn surround(&self, open: &str) -> Option<&str> {
        self.config
            .surrounding_pairs
            .iter()
            .find(|pair| pair.open == open)
            .map(|pair| pair.close.as_str())
    }

    /// Line `(start, end)` pairs of matched regions, in the order they close.
    /// Unmatched markers are ignored.
    pub fn folding_ranges<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Vec<(usize, usize)> {
        let mut open = Vec::new();
        let mut ranges = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            if self.starts_region(line) {
                open.push(index);
            } else if self.ends_region(line) {
                if let Some(start) = open.pop() {
                    ranges.push((start, index));
                }
            }
        }
        ranges
    }
}
