//! Change-set partitioning of the working set.

use crate::table::{ColumnDescriptor, KeyRecord, RowRecord, RowState, WorkingSet};

/// A persisted row to rewrite, addressed by its original key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    /// Key captured at load/import time
    pub key: KeyRecord,
    /// Current row values
    pub values: RowRecord,
}

/// A single pending change, borrowed from a [`ChangeSet`].
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    /// Remove the row with this key
    Delete(&'a KeyRecord),
    /// Insert a new row
    Insert(&'a RowRecord),
    /// Rewrite non-key columns of an existing row
    Update(&'a RowUpdate),
}

/// Working-set rows partitioned by what must happen in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// `Added` rows
    pub inserts: Vec<RowRecord>,
    /// `Modified` rows with their original keys
    pub updates: Vec<RowUpdate>,
    /// Original keys of `DeletePending` rows
    pub deletes: Vec<KeyRecord>,
}

impl ChangeSet {
    /// Partitions `working_set` by row state. `Unchanged` rows are left out.
    ///
    /// UPDATE and DELETE keys always come from the original key snapshot.
    /// A pending delete with no snapshot falls back to its current key cells.
    ///
    /// # Arguments
    /// * `working_set` - Rows to partition
    /// * `columns` - Column descriptors the rows are laid out by
    ///
    /// # Returns
    /// The change set in visible row order within each group.
    pub fn build(working_set: &WorkingSet, columns: &[ColumnDescriptor]) -> Self {
        let mut set = ChangeSet::default();

        for (handle, row, state) in working_set.iter() {
            match state {
                RowState::Unchanged => {}
                RowState::Added => set.inserts.push(row.clone()),
                RowState::Modified => {
                    let key = working_set
                        .original_key(handle)
                        .cloned()
                        .unwrap_or_else(|| KeyRecord::capture(columns, row));
                    set.updates.push(RowUpdate {
                        key,
                        values: row.clone(),
                    });
                }
                RowState::DeletePending => {
                    let key = match working_set.original_key(handle) {
                        Some(key) => key.clone(),
                        None => {
                            tracing::warn!(
                                "Row {} pending deletion has no original key; using current values",
                                handle
                            );
                            KeyRecord::capture(columns, row)
                        }
                    };
                    set.deletes.push(key);
                }
            }
        }

        set
    }

    /// Iterates changes in commit order: deletes, then inserts, then updates.
    pub fn changes(&self) -> impl Iterator<Item = Change<'_>> + '_ {
        self.deletes
            .iter()
            .map(Change::Delete)
            .chain(self.inserts.iter().map(Change::Insert))
            .chain(self.updates.iter().map(Change::Update))
    }

    /// Total number of changes.
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }

    /// Returns true if there is nothing to persist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
