use thiserror::Error;

/// Errors raised while compiling a [`GrammarDefinition`](super::GrammarDefinition).
///
/// Rule indices count rules after includes have been spliced in.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("grammar `{grammar}` has no `root` state")]
    MissingRoot { grammar: String },

    #[error("state `{state}` is defined twice")]
    DuplicateState { state: String },

    #[error("state `{state}` includes unknown state `{target}`")]
    UnknownInclude { state: String, target: String },

    #[error("include cycle through state `{state}`")]
    IncludeCycle { state: String },

    #[error("state `{state}` rule {index}: transition `{next}` targets unknown state `{target}`")]
    UnknownState {
        state: String,
        index: usize,
        next: String,
        target: String,
    },

    #[error("state `{state}` rule {index}: unrecognised transition `{next}`")]
    InvalidTransition {
        state: String,
        index: usize,
        next: String,
    },

    #[error("state `{state}` rule {index}: unknown class set `@{set}`")]
    UnknownClassSet {
        state: String,
        index: usize,
        set: String,
    },

    #[error("pattern `{pattern}` references unknown macro `@{name}`")]
    UnknownMacro { pattern: String, name: String },

    #[error("macro `@{name}` expands into itself")]
    MacroCycle { name: String },

    #[error("state `{state}` rule {index}: invalid pattern `{pattern}`")]
    InvalidPattern {
        state: String,
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("state `{state}` rule {index}: invalid guard `{guard}`: {reason}")]
    InvalidGuard {
        state: String,
        index: usize,
        guard: String,
        reason: String,
    },

    #[error("state `{state}` rule {index}: {reason}")]
    InvalidAction {
        state: String,
        index: usize,
        reason: String,
    },

    #[error("invalid JSON grammar: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML grammar: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, GrammarError>;
