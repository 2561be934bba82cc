//! Change tracking and reconciliation engine for maintaining a relational table.
//!
//! Provides the working-set row model, per-row edit state, validation,
//! change-set and SQL synthesis, spreadsheet import reconciliation, and the
//! collaborator contracts (schema, row store, tabular I/O, binary codec).

pub mod codec;
pub mod config;
pub mod error;
pub mod persistence;
pub mod reconcile;
pub mod session;
pub mod table;
pub mod tabular;
pub mod transaction;

pub use error::SyncError;
pub use session::{DeleteSummary, ImportSummary, SaveSummary, TableSession};
