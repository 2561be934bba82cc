//! Row records, identity handles, and lifecycle state.

use std::fmt;

use super::column::{primary_key_indexes, ColumnDescriptor};

/// Stable identity of a row within one working set.
///
/// Handles are never reused while the working set lives, so state and key
/// side tables stay correct across insertions and removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle(pub(crate) u64);

impl RowHandle {
    /// Returns the raw handle value.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a working-set row relative to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    /// Matches what was loaded
    Unchanged,
    /// At least one cell differs from what was loaded
    Modified,
    /// Never persisted
    Added,
    /// Persisted row scheduled for deletion
    DeletePending,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RowState::Unchanged => "unchanged",
            RowState::Modified => "modified",
            RowState::Added => "added",
            RowState::DeletePending => "delete pending",
        };
        f.write_str(label)
    }
}

/// Column-indexed row values, parallel to the column descriptor list.
///
/// Non-binary cells hold their display text; binary cells hold the codec's
/// display form and are only encoded when bound as statement parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowRecord {
    cells: Vec<Option<String>>,
}

impl RowRecord {
    /// Creates a row of `column_count` null cells.
    pub fn empty(column_count: usize) -> Self {
        Self {
            cells: vec![None; column_count],
        }
    }

    /// Creates a row from cells already in descriptor order.
    pub fn from_cells(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Returns the raw cell at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    /// Returns the display text of the cell at `index`; null displays as "".
    pub fn display(&self, index: usize) -> &str {
        self.get(index).unwrap_or("")
    }

    /// Returns the display text of the named cell.
    pub fn display_by_name<'a>(&'a self, columns: &[ColumnDescriptor], name: &str) -> &'a str {
        super::column::column_index(columns, name)
            .map(|i| self.display(i))
            .unwrap_or("")
    }

    pub(crate) fn set(&mut self, index: usize, value: Option<String>) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, None);
        }
        self.cells[index] = value;
    }

    /// Returns all cells in descriptor order.
    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Primary-key values captured for a persisted row, in key-column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    values: Vec<Option<String>>,
}

impl KeyRecord {
    /// Captures the primary-key cells of `row`.
    pub fn capture(columns: &[ColumnDescriptor], row: &RowRecord) -> Self {
        let values = primary_key_indexes(columns)
            .into_iter()
            .map(|i| row.get(i).map(str::to_string))
            .collect();
        Self { values }
    }

    /// Creates a key from values already in key-column order.
    pub fn from_values(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Key values in key-column order.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }
}

/// Ordered concatenation of a row's primary-key display values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Builds the composite key of `row` using `separator` between parts.
    pub fn of_row(columns: &[ColumnDescriptor], row: &RowRecord, separator: char) -> Self {
        let parts: Vec<&str> = primary_key_indexes(columns)
            .into_iter()
            .map(|i| row.display(i))
            .collect();
        Self(parts.join(&separator.to_string()))
    }

    /// Returns the joined key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
