//! Grammars
//!
//!     The built-in Move grammar lives in [`move_lang`]. Other grammars can be loaded from JSON
//!     or YAML files with [`load_file`]; they compile into the same kind of table and run on the
//!     same tokenizer.

pub mod move_lang;

use crate::rules::{GrammarDefinition, GrammarError, RuleTable};
use std::path::Path;

/// Reads a grammar definition, choosing the format from the file extension (`.json`,
/// `.yaml`/`.yml`).
pub fn load_file(path: &Path) -> Result<RuleTable, LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let definition = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => GrammarDefinition::from_yaml(&source).map_err(GrammarError::from)?,
        _ => GrammarDefinition::from_json(&source).map_err(GrammarError::from)?,
    };
    tracing::debug!(path = %path.display(), grammar = %definition.name, "loaded grammar file");
    Ok(RuleTable::compile(&definition)?)
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read grammar file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}
