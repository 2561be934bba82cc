//! Spreadsheet import/export contracts.
//!
//! The engine never touches file formats; it consumes string-keyed rows from
//! a [`TabularImporter`] and hands display rows to a [`TabularExporter`].

#[cfg(feature = "xlsx")]
mod xlsx;

#[cfg(feature = "xlsx")]
pub use xlsx::XlsxTabular;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::table::{column_key, ColumnDescriptor, RowRecord};

/// Spreadsheet read/write errors.
#[derive(Error, Debug)]
pub enum TabularError {
    /// File could not be opened or parsed
    #[error("read error: {0}")]
    Read(String),

    /// File could not be written
    #[error("write error: {0}")]
    Write(String),

    /// Workbook has no worksheet to read
    #[error("workbook contains no worksheets")]
    NoWorksheet,
}

/// One imported row: raw strings keyed by header, matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedRow {
    fields: HashMap<String, String>,
}

impl ImportedRow {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row from (header, value) pairs; later duplicates win.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.insert(k.as_ref(), v);
        }
        row
    }

    /// Sets the value under `header`.
    pub fn insert(&mut self, header: &str, value: impl Into<String>) {
        self.fields.insert(column_key(header), value.into());
    }

    /// Returns the value under `header`.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(&column_key(header)).map(String::as_str)
    }

    /// Lays the row out by `columns`; missing columns become empty text.
    pub fn to_record(&self, columns: &[ColumnDescriptor]) -> RowRecord {
        RowRecord::from_cells(
            columns
                .iter()
                .map(|c| Some(self.get(&c.name).unwrap_or_default().to_string()))
                .collect(),
        )
    }
}

/// Rows read from a source plus non-fatal warnings.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Data rows in file order
    pub rows: Vec<ImportedRow>,
    /// Problems that did not stop the import, such as missing columns
    pub warnings: Vec<String>,
}

/// Reads string-keyed rows from a tabular file.
pub trait TabularImporter {
    /// Reads `source`, warning about any `expected_columns` it lacks.
    fn import_rows(
        &self,
        source: &Path,
        expected_columns: &[ColumnDescriptor],
    ) -> Result<ImportOutcome, TabularError>;
}

/// Writes display rows to a tabular file.
pub trait TabularExporter {
    /// Writes a header of column names followed by `rows`.
    fn export_rows(
        &self,
        destination: &Path,
        columns: &[ColumnDescriptor],
        rows: &[RowRecord],
    ) -> Result<(), TabularError>;
}

/// Warning text for an expected column absent from the source header.
pub fn missing_column_warning(column: &str) -> String {
    format!("column [{}] not found; treated as empty", column)
}
