//! Integration tests against an in-memory SQLite store.
//!
//! Tests are organized by area:
//! - save: ordering, atomicity, reload and identity handling
//! - import: reconciliation of imported rows through a session
//! - xlsx: spreadsheet export and re-import

pub mod helpers;
pub mod import_tests;
pub mod save_tests;
#[cfg(feature = "xlsx")]
pub mod xlsx_tests;
