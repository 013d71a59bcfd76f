//! Configuration for the macro editor
//!
//! Loaded from an optional TOML file; every field has a default so a
//! missing file (or a partial one) is fine. CLI flags are applied on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where ObinsKit keeps macros inside its SQLite database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Table holding one row per macro
    pub table: String,
    /// Column with the macro's unique name
    pub name_column: String,
    /// Column with the encoded `macro_value`
    pub value_column: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: "kbd_macro_new".to_string(),
            name_column: "name".to_string(),
            value_column: "macro_value".to_string(),
        }
    }
}

impl StoreConfig {
    /// Table and column names are spliced into SQL, so only plain
    /// identifiers are accepted. Returns the first offending name.
    pub fn invalid_identifier(&self) -> Option<&str> {
        [&self.table, &self.name_column, &self.value_column]
            .into_iter()
            .map(String::as_str)
            .find(|ident| !is_sql_identifier(ident))
    }
}

fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Top-level editor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Editor command line; falls back to `$VISUAL`, `$EDITOR`, then `vi`
    pub editor: Option<String>,
    /// Edit the database file directly instead of a temporary copy
    pub in_place: bool,
    pub store: StoreConfig,
}

impl EditConfig {
    /// Default config file location (~/.config/obinskit/macro-edit.toml)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("obinskit")
            .join("macro-edit.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: EditConfig = toml::from_str(&content)?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}
