//! Collaborator contracts for schema reflection and row storage, and the
//! SQLite implementation of both.

mod sqlite;

pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::table::ColumnDescriptor;
use crate::transaction::{SqlValue, Statement};

/// Row store and schema provider errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Table does not exist in the backend
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// Statement failed while applying a batch
    #[error("Statement failed: {message} (sql: {sql})")]
    StatementFailed { sql: String, message: String },

    /// Backend driver error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Read-only schema reflection.
pub trait SchemaProvider {
    /// Returns the ordered column descriptors of `table`.
    ///
    /// # Arguments
    /// * `table` - Table name
    /// * `primary_keys` - Configured primary-key column names (case-insensitive)
    fn get_columns(
        &self,
        table: &str,
        primary_keys: &[String],
    ) -> Result<Vec<ColumnDescriptor>, StoreError>;
}

/// Read and transactional write access to table rows.
pub trait RowStore {
    /// Reads every row of `table`, cells in descriptor order.
    fn fetch_all(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<Vec<Vec<SqlValue>>, StoreError>;

    /// Executes `statements` in order inside one transaction.
    ///
    /// Either every statement takes effect or none does.
    ///
    /// # Returns
    /// Total rows affected.
    fn apply_changes(&mut self, table: &str, statements: &[Statement]) -> Result<usize, StoreError>;
}
