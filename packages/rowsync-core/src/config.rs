//! Application and session configuration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Settings file contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Tables available for maintenance
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// One maintainable table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableConfig {
    /// Table name in the database
    pub name: String,
    /// Label shown to users; defaults to `name`
    #[serde(default)]
    pub display_name: String,
    /// Primary-key column names
    #[serde(default)]
    pub primary_keys: Vec<String>,
}

impl TableConfig {
    /// Creates a table config with `name` as display name.
    pub fn new(name: impl Into<String>, primary_keys: &[&str]) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            primary_keys: primary_keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Returns the display name, falling back to the table name.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

impl AppSettings {
    /// Reads and validates a JSON settings file.
    ///
    /// # Arguments
    /// * `path` - Settings file path
    ///
    /// # Returns
    /// `Result<AppSettings, SyncError>` with the parsed settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        let mut settings = Self::from_json(&text)?;

        // Relative database paths are resolved against the settings file.
        if settings.database_path.is_relative() {
            if let Some(dir) = path.parent() {
                settings.database_path = dir.join(&settings.database_path);
            }
        }
        Ok(settings)
    }

    /// Parses and validates settings from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        let settings: AppSettings =
            serde_json::from_str(text).map_err(|e| SyncError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks table entries are usable.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.tables.is_empty() {
            return Err(SyncError::Config("no tables configured".to_string()));
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(SyncError::Config("table with empty name".to_string()));
            }
            if !seen.insert(table.name.to_ascii_lowercase()) {
                return Err(SyncError::Config(format!(
                    "table '{}' configured more than once",
                    table.name
                )));
            }
            if table.primary_keys.is_empty() {
                return Err(SyncError::Config(format!(
                    "table '{}' has no primary keys",
                    table.name
                )));
            }
        }
        Ok(())
    }

    /// Looks up a table by name or display name, case-insensitively.
    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| {
            t.name.eq_ignore_ascii_case(name) || t.label().eq_ignore_ascii_case(name)
        })
    }
}

/// Per-session engine settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Separator between composite key parts; must not occur in key data
    pub key_separator: char,
    /// Delimiter between list items in binary column display text
    pub binary_delimiter: char,
    /// Treat an import with no data rows as a no-op instead of deleting everything
    pub ignore_empty_import: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_separator: '\0',
            binary_delimiter: ',',
            ignore_empty_import: true,
        }
    }
}
