//! Column descriptors, row records, the working set, the original snapshot,
//! and validation.

mod column;
mod row;
mod snapshot;
mod validation;
mod working_set;

pub use column::{column_index, column_key, primary_key_indexes, ColumnDescriptor};
pub use row::{CompositeKey, KeyRecord, RowHandle, RowRecord, RowState};
pub use snapshot::OriginalSnapshot;
pub use validation::{validate, Violation, ViolationKind};
pub use working_set::{CellEdit, DeleteOutcome, EditRejection, StateCounts, WorkingSet};
