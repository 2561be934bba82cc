//! In-memory working set with per-row state side tables.
//!
//! Rows are identified by [`RowHandle`]. Values, lifecycle state and the
//! original key snapshot live in separate maps keyed by handle; `order`
//! holds the visible row order.

use std::collections::HashMap;

use crate::error::SyncError;

use super::column::{column_index, ColumnDescriptor};
use super::row::{KeyRecord, RowHandle, RowRecord, RowState};

/// Reason a cell edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRejection {
    /// Primary-key cells of persisted rows are read-only
    PersistedPrimaryKey,
    /// Rows scheduled for deletion cannot be edited
    DeletePending,
}

impl std::fmt::Display for EditRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditRejection::PersistedPrimaryKey => {
                f.write_str("primary key of a persisted row is read-only")
            }
            EditRejection::DeletePending => f.write_str("row is pending deletion"),
        }
    }
}

/// Result of deleting a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Never-persisted row removed outright
    Removed,
    /// Persisted row marked for deletion
    MarkedPending,
    /// Row was already pending deletion
    AlreadyPending,
}

/// Number of rows in each lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub unchanged: usize,
    pub modified: usize,
    pub added: usize,
    pub delete_pending: usize,
}

impl StateCounts {
    /// Total rows counted.
    pub fn total(&self) -> usize {
        self.unchanged + self.modified + self.added + self.delete_pending
    }
}

/// Working copy of a table's rows.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    /// Visible row order
    order: Vec<RowHandle>,
    /// Row values by handle
    values: HashMap<RowHandle, RowRecord>,
    /// Lifecycle state by handle
    states: HashMap<RowHandle, RowState>,
    /// Key captured at load/import time; absent exactly for `Added` rows
    original_keys: HashMap<RowHandle, KeyRecord>,
    /// Next handle to assign
    next_handle: u64,
    /// Cells per row
    column_count: usize,
}

impl WorkingSet {
    /// Creates an empty working set for rows of `column_count` cells.
    pub fn new(column_count: usize) -> Self {
        Self {
            column_count,
            ..Default::default()
        }
    }

    fn allocate(&mut self) -> RowHandle {
        let handle = RowHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Appends a persisted row with its captured original key.
    ///
    /// # Arguments
    /// * `row` - Row values in descriptor order
    /// * `state` - Initial state; `Added` is not accepted here
    /// * `key` - Original key snapshot used for UPDATE/DELETE
    ///
    /// # Returns
    /// Handle of the appended row.
    pub fn push_persisted(&mut self, row: RowRecord, state: RowState, key: KeyRecord) -> RowHandle {
        debug_assert!(state != RowState::Added, "persisted rows carry a key");
        // Keyed rows are never `Added`.
        let state = if state == RowState::Added {
            RowState::Modified
        } else {
            state
        };
        let handle = self.allocate();
        self.order.push(handle);
        self.values.insert(handle, row);
        self.states.insert(handle, state);
        self.original_keys.insert(handle, key);
        handle
    }

    /// Appends a never-persisted row in state `Added`.
    ///
    /// # Arguments
    /// * `row` - Initial values, or `None` for an all-null row
    ///
    /// # Returns
    /// Handle of the appended row.
    pub fn mark_added(&mut self, row: Option<RowRecord>) -> RowHandle {
        let row = row.unwrap_or_else(|| RowRecord::empty(self.column_count));
        let handle = self.allocate();
        self.order.push(handle);
        self.values.insert(handle, row);
        self.states.insert(handle, RowState::Added);
        handle
    }

    /// Removes `handle` if it was never persisted.
    ///
    /// # Returns
    /// `true` when the row was `Added` and has been removed.
    pub fn unmark_if_newly_added(&mut self, handle: RowHandle) -> bool {
        if self.states.get(&handle) != Some(&RowState::Added) {
            return false;
        }
        self.order.retain(|h| *h != handle);
        self.values.remove(&handle);
        self.states.remove(&handle);
        self.original_keys.remove(&handle);
        true
    }

    /// Schedules a row for deletion.
    ///
    /// `Added` rows are removed outright since they have nothing to delete
    /// in storage.
    pub fn mark_delete_pending(&mut self, handle: RowHandle) -> Result<DeleteOutcome, SyncError> {
        let state = self.state(handle).ok_or(SyncError::RowNotFound(handle))?;
        let outcome = match state {
            RowState::Added => {
                self.unmark_if_newly_added(handle);
                DeleteOutcome::Removed
            }
            RowState::DeletePending => DeleteOutcome::AlreadyPending,
            RowState::Unchanged | RowState::Modified => {
                self.states.insert(handle, RowState::DeletePending);
                DeleteOutcome::MarkedPending
            }
        };
        Ok(outcome)
    }

    /// Starts an edit of one cell.
    ///
    /// The edit guard checks are made here, before any value is written,
    /// and the pre-edit value is captured for the state comparison at commit.
    ///
    /// # Arguments
    /// * `columns` - Column descriptors the rows are laid out by
    /// * `handle` - Row to edit
    /// * `column` - Column name (case-insensitive)
    ///
    /// # Returns
    /// `Result<CellEdit, SyncError>`; `EditNotAllowed` for read-only cells.
    pub fn begin_edit<'a>(
        &'a mut self,
        columns: &[ColumnDescriptor],
        handle: RowHandle,
        column: &str,
    ) -> Result<CellEdit<'a>, SyncError> {
        let index =
            column_index(columns, column).ok_or_else(|| SyncError::ColumnNotFound(column.to_string()))?;
        let state = self.state(handle).ok_or(SyncError::RowNotFound(handle))?;
        let descriptor = &columns[index];

        if state == RowState::DeletePending {
            return Err(SyncError::EditNotAllowed {
                row: handle,
                column: descriptor.name.clone(),
                reason: EditRejection::DeletePending,
            });
        }
        if descriptor.primary_key && state != RowState::Added {
            return Err(SyncError::EditNotAllowed {
                row: handle,
                column: descriptor.name.clone(),
                reason: EditRejection::PersistedPrimaryKey,
            });
        }

        let before = self
            .values
            .get(&handle)
            .and_then(|row| row.get(index))
            .map(str::to_string);

        Ok(CellEdit {
            set: self,
            handle,
            index,
            state,
            before,
        })
    }

    /// Writes one cell through a begin/commit edit pair.
    ///
    /// # Returns
    /// The row state after the edit.
    pub fn set_cell_value(
        &mut self,
        columns: &[ColumnDescriptor],
        handle: RowHandle,
        column: &str,
        value: Option<String>,
    ) -> Result<RowState, SyncError> {
        Ok(self.begin_edit(columns, handle, column)?.commit(value))
    }

    /// Returns the state of `handle`.
    pub fn state(&self, handle: RowHandle) -> Option<RowState> {
        self.states.get(&handle).copied()
    }

    /// Returns the values of `handle`.
    pub fn row(&self, handle: RowHandle) -> Option<&RowRecord> {
        self.values.get(&handle)
    }

    /// Returns the original key snapshot of `handle`, if it was ever persisted.
    pub fn original_key(&self, handle: RowHandle) -> Option<&KeyRecord> {
        self.original_keys.get(&handle)
    }

    /// Returns the 1-based visible position of `handle`.
    pub fn position(&self, handle: RowHandle) -> Option<usize> {
        self.order.iter().position(|h| *h == handle).map(|i| i + 1)
    }

    /// Returns the handle at 1-based visible `position`.
    pub fn handle_at(&self, position: usize) -> Option<RowHandle> {
        position
            .checked_sub(1)
            .and_then(|i| self.order.get(i))
            .copied()
    }

    /// Row handles in visible order.
    pub fn handles(&self) -> &[RowHandle] {
        &self.order
    }

    /// Iterates rows in visible order as (handle, values, state).
    pub fn iter(&self) -> impl Iterator<Item = (RowHandle, &RowRecord, RowState)> + '_ {
        self.order.iter().filter_map(move |h| {
            let row = self.values.get(h)?;
            let state = self.states.get(h)?;
            Some((*h, row, *state))
        })
    }

    /// Number of rows, including rows pending deletion.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Cells per row.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Counts rows per lifecycle state.
    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for state in self.states.values() {
            match state {
                RowState::Unchanged => counts.unchanged += 1,
                RowState::Modified => counts.modified += 1,
                RowState::Added => counts.added += 1,
                RowState::DeletePending => counts.delete_pending += 1,
            }
        }
        counts
    }

    /// Returns true if any row is not `Unchanged`.
    pub fn has_unsaved_changes(&self) -> bool {
        self.states.values().any(|s| *s != RowState::Unchanged)
    }
}

/// An open single-cell edit.
///
/// Holds the value seen when the edit began; [`CellEdit::commit`] writes the
/// new value and promotes an `Unchanged` row to `Modified` when it differs.
#[derive(Debug)]
pub struct CellEdit<'a> {
    set: &'a mut WorkingSet,
    handle: RowHandle,
    index: usize,
    state: RowState,
    before: Option<String>,
}

impl CellEdit<'_> {
    /// Value of the cell when the edit began.
    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    /// Writes `value` and updates the row state.
    ///
    /// # Returns
    /// The row state after the edit.
    pub fn commit(self, value: Option<String>) -> RowState {
        let changed = value != self.before;
        if let Some(row) = self.set.values.get_mut(&self.handle) {
            row.set(self.index, value);
        }

        if self.state == RowState::Unchanged && changed {
            self.set.states.insert(self.handle, RowState::Modified);
            return RowState::Modified;
        }
        self.state
    }
}
