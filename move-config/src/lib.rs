//! Shared configuration loader for move-hl.
//!
//! `defaults/move.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`MoveConfig`].

pub mod language;
pub mod theme;

pub use language::{Language, LanguageConfig, LanguageError, Scope};
pub use theme::{Rgb, Style, Theme, ThemeConfig, ThemeError};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/move.default.toml");

/// Top-level configuration consumed by move-hl applications.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveConfig {
    pub lexer: LexerConfig,
    pub semantic: SemanticConfig,
    pub theme: ThemeConfig,
    pub language: LanguageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LexerConfig {
    pub max_stack_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticConfig {
    pub enabled: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid theme: {0}")]
    Theme(#[from] ThemeError),
    #[error("invalid language configuration: {0}")]
    Language(#[from] LanguageError),
    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder, deserialize, and validate the result (theme and language included).
    pub fn build(self) -> Result<MoveConfig, ConfigError> {
        let config: MoveConfig = self.builder.build()?.try_deserialize()?;
        if config.lexer.max_stack_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "lexer.max_stack_depth",
                message: "must be at least 1".to_string(),
            });
        }
        config.theme.compile()?;
        config.language.compile()?;
        tracing::debug!(
            max_stack_depth = config.lexer.max_stack_depth,
            semantic = config.semantic.enabled,
            theme_rules = config.theme.rules.len(),
            "loaded configuration"
        );
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MoveConfig, ConfigError> {
    Loader::new().build()
}
