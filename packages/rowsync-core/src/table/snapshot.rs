//! Rows as last fetched from storage, indexed by composite key.

use std::collections::HashMap;

use super::column::ColumnDescriptor;
use super::row::{CompositeKey, RowRecord};

/// Storage contents at the last successful load.
///
/// Retained only so imports can be diffed against it; replaced on every
/// load and left untouched by imports.
#[derive(Debug, Clone, Default)]
pub struct OriginalSnapshot {
    /// Rows in fetch order
    rows: Vec<RowRecord>,
    /// Composite key to position in `rows`
    index: HashMap<CompositeKey, usize>,
    /// Separator used to build composite keys
    separator: char,
}

impl OriginalSnapshot {
    /// Creates an empty snapshot using `separator` between key parts.
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            ..Default::default()
        }
    }

    /// Appends a fetched row.
    pub fn push(&mut self, columns: &[ColumnDescriptor], row: RowRecord) {
        let key = CompositeKey::of_row(columns, &row, self.separator);
        self.index.insert(key, self.rows.len());
        self.rows.push(row);
    }

    /// Returns the row stored under `key`.
    pub fn get(&self, key: &CompositeKey) -> Option<&RowRecord> {
        self.index.get(key).and_then(|i| self.rows.get(*i))
    }

    /// Rows in fetch order.
    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    /// Separator used for composite keys.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the snapshot holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
