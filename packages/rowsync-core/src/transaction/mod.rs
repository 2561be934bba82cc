//! Change-set partitioning, SQL synthesis, and commit ordering.

mod change;
mod statement;

pub use change::{Change, ChangeSet, RowUpdate};
pub use statement::{quote_identifier, BoundParam, SqlSynthesizer, SqlValue, Statement};
