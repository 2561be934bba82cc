//! Engine error types.

use thiserror::Error;

use crate::table::{EditRejection, RowHandle, Violation};

/// Engine operation errors.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Column reflection failed or disagrees with the configured keys
    #[error("Schema lookup failed for table '{table}': {reason}")]
    SchemaLookupFailure { table: String, reason: String },

    /// Fetching the table rows failed
    #[error("Failed to load table '{table}': {reason}")]
    LoadFailure { table: String, reason: String },

    /// Rows failed pre-save validation
    #[error("Validation failed with {} problem(s)", .0.len())]
    ValidationFailure(Vec<Violation>),

    /// Cell edit rejected before any value was written
    #[error("Edit of column '{column}' on row {row} not allowed: {reason}")]
    EditNotAllowed {
        row: RowHandle,
        column: String,
        reason: EditRejection,
    },

    /// Transactional apply failed and was rolled back
    #[error("Failed to save table '{table}', all changes rolled back: {reason}")]
    PersistenceFailure { table: String, reason: String },

    /// Imported file could not be read
    #[error("Failed to import '{source_name}': {reason}")]
    ImportParseFailure { source_name: String, reason: String },

    /// Export could not be written
    #[error("Failed to export to '{destination}': {reason}")]
    ExportFailure { destination: String, reason: String },

    /// Row handle not present in the working set
    #[error("Row {0} not found in working set")]
    RowNotFound(RowHandle),

    /// Column name not present in the loaded schema
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// Operation requires a loaded table
    #[error("No table loaded")]
    NoTableLoaded,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
