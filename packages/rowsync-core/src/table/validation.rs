//! Pre-save constraint checks on working-set rows.

use std::fmt;

use super::column::ColumnDescriptor;
use super::row::RowState;
use super::working_set::WorkingSet;

/// Kind of constraint a cell violates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// NOT NULL column left empty
    Required,
    /// Display text longer than the declared maximum
    TooLong { max_length: usize, actual: usize },
}

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based visible row position
    pub row: usize,
    /// Column name
    pub column: String,
    /// What was violated
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Required => {
                write!(f, "row {} [{}] is required", self.row, self.column)
            }
            ViolationKind::TooLong { max_length, .. } => write!(
                f,
                "row {} [{}] must be at most {} characters",
                self.row, self.column, max_length
            ),
        }
    }
}

/// Checks every `Modified` and `Added` row against the column constraints.
///
/// Rows that are `Unchanged` or pending deletion are never checked. Identity
/// columns of `Added` rows are skipped since the server assigns them. Binary
/// columns are exempt from the required check because an empty display
/// value encodes an empty list.
///
/// # Arguments
/// * `working_set` - Rows to check
/// * `columns` - Column descriptors the rows are laid out by
///
/// # Returns
/// Every violation found, in row then column order.
pub fn validate(working_set: &WorkingSet, columns: &[ColumnDescriptor]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (position, (_, row, state)) in working_set.iter().enumerate() {
        if !matches!(state, RowState::Modified | RowState::Added) {
            continue;
        }

        for (index, column) in columns.iter().enumerate() {
            if column.identity && state == RowState::Added {
                continue;
            }

            let value = row.display(index);

            if !column.nullable && !column.is_binary() && value.is_empty() {
                violations.push(Violation {
                    row: position + 1,
                    column: column.name.clone(),
                    kind: ViolationKind::Required,
                });
            }

            if let Some(max_length) = column.effective_max_length() {
                let actual = value.chars().count();
                if actual > max_length {
                    violations.push(Violation {
                        row: position + 1,
                        column: column.name.clone(),
                        kind: ViolationKind::TooLong { max_length, actual },
                    });
                }
            }
        }
    }

    violations
}
