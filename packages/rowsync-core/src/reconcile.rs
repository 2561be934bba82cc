//! Three-way reconciliation of an imported row set.
//!
//! The imported rows replace the working set wholesale. Each row is matched
//! to the original snapshot by composite key to decide its state, and
//! snapshot rows missing from the import come back as pending deletes.

use std::collections::HashSet;

use crate::table::{
    ColumnDescriptor, CompositeKey, KeyRecord, OriginalSnapshot, RowState, WorkingSet,
};
use crate::tabular::ImportedRow;

/// Builds a replacement working set from `imported` diffed against `snapshot`.
///
/// - an imported row whose key is in the snapshot is `Modified` if any
///   column's display text differs (exact comparison), else `Unchanged`;
///   its original key is taken from the matched snapshot row
/// - an imported row with an unknown key is `Added`
/// - a snapshot row no imported row matched is appended as `DeletePending`
///
/// Duplicate keys in `imported` are not rejected: every imported row is
/// emitted as its own working-set row.
///
/// # Arguments
/// * `columns` - Column descriptors rows are laid out by
/// * `imported` - Rows read from the external source, in file order
/// * `snapshot` - Storage contents at the last load
///
/// # Returns
/// The replacement working set.
pub fn reconcile(
    columns: &[ColumnDescriptor],
    imported: &[ImportedRow],
    snapshot: &OriginalSnapshot,
) -> WorkingSet {
    let separator = snapshot.separator();
    let mut working_set = WorkingSet::new(columns.len());
    let mut seen: HashSet<CompositeKey> = HashSet::with_capacity(imported.len());

    for imported_row in imported {
        let record = imported_row.to_record(columns);
        let key = CompositeKey::of_row(columns, &record, separator);

        match snapshot.get(&key) {
            Some(original) => {
                let changed =
                    (0..columns.len()).any(|i| original.display(i) != record.display(i));
                let state = if changed {
                    RowState::Modified
                } else {
                    RowState::Unchanged
                };
                let original_key = KeyRecord::capture(columns, original);
                working_set.push_persisted(record, state, original_key);
            }
            None => {
                working_set.mark_added(Some(record));
            }
        }

        seen.insert(key);
    }

    for original in snapshot.rows() {
        let key = CompositeKey::of_row(columns, original, separator);
        if seen.contains(&key) {
            continue;
        }
        let original_key = KeyRecord::capture(columns, original);
        working_set.push_persisted(original.clone(), RowState::DeletePending, original_key);
    }

    working_set
}
