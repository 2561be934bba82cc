//! Parameterized SQL synthesis for change sets.
//!
//! Identifiers are double-quoted. Value parameters are named after their
//! column; WHERE parameters carry a `pk_` prefix so they never collide with
//! SET parameters. The column ordinal is appended to keep names unique after
//! sanitizing.

use crate::codec::{display_to_payload, BinaryCodec};
use crate::table::{primary_key_indexes, ColumnDescriptor, KeyRecord, RowRecord};

use super::change::{Change, ChangeSet, RowUpdate};

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Text in display form
    Text(String),
    /// Binary payload
    Bytes(Vec<u8>),
}

/// A named statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    /// Parameter name including the `@` sigil
    pub name: String,
    /// Bound value
    pub value: SqlValue,
}

/// A parameterized statement ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text
    pub sql: String,
    /// Parameters in the order they appear in `sql`
    pub params: Vec<BoundParam>,
}

/// Builds INSERT/UPDATE/DELETE statements for one table.
pub struct SqlSynthesizer<'a> {
    table: &'a str,
    columns: &'a [ColumnDescriptor],
    codec: &'a dyn BinaryCodec,
    binary_delimiter: char,
}

impl<'a> SqlSynthesizer<'a> {
    /// Creates a synthesizer for `table`.
    ///
    /// # Arguments
    /// * `table` - Table name
    /// * `columns` - Column descriptors in table order
    /// * `codec` - Codec for binary columns
    /// * `binary_delimiter` - Delimiter of binary display text
    pub fn new(
        table: &'a str,
        columns: &'a [ColumnDescriptor],
        codec: &'a dyn BinaryCodec,
        binary_delimiter: char,
    ) -> Self {
        Self {
            table,
            columns,
            codec,
            binary_delimiter,
        }
    }

    /// Builds all statements for `changes` in commit order.
    pub fn plan(&self, changes: &ChangeSet) -> Vec<Statement> {
        changes
            .changes()
            .filter_map(|change| match change {
                Change::Delete(key) => Some(self.delete(key)),
                Change::Insert(row) => Some(self.insert(row)),
                Change::Update(update) => self.update(update),
            })
            .collect()
    }

    /// Builds an INSERT for a new row.
    ///
    /// Identity columns with no value are left out so the server assigns them.
    pub fn insert(&self, row: &RowRecord) -> Statement {
        let mut names = Vec::new();
        let mut placeholders = Vec::new();
        let mut params = Vec::new();

        for (index, column) in self.columns.iter().enumerate() {
            if column.identity && row.display(index).is_empty() {
                continue;
            }
            let name = param_name("", column, index);
            names.push(quote_identifier(&column.name));
            placeholders.push(name.clone());
            params.push(BoundParam {
                name,
                value: self.bind(column, row.get(index)),
            });
        }

        Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_identifier(self.table),
                names.join(", "),
                placeholders.join(", ")
            ),
            params,
        }
    }

    /// Builds an UPDATE of every non-key column, keyed by the original key.
    ///
    /// # Returns
    /// `None` when the table has no non-key columns.
    pub fn update(&self, update: &RowUpdate) -> Option<Statement> {
        let mut sets = Vec::new();
        let mut params = Vec::new();

        for (index, column) in self.columns.iter().enumerate() {
            if column.primary_key {
                continue;
            }
            let name = param_name("", column, index);
            sets.push(format!("{} = {}", quote_identifier(&column.name), name));
            params.push(BoundParam {
                name,
                value: self.bind(column, update.values.get(index)),
            });
        }

        if sets.is_empty() {
            return None;
        }

        let (predicate, key_params) = self.key_predicate(&update.key);
        params.extend(key_params);

        Some(Statement {
            sql: format!(
                "UPDATE {} SET {} WHERE {}",
                quote_identifier(self.table),
                sets.join(", "),
                predicate
            ),
            params,
        })
    }

    /// Builds a DELETE keyed by `key`.
    pub fn delete(&self, key: &KeyRecord) -> Statement {
        let (predicate, params) = self.key_predicate(key);
        Statement {
            sql: format!(
                "DELETE FROM {} WHERE {}",
                quote_identifier(self.table),
                predicate
            ),
            params,
        }
    }

    fn key_predicate(&self, key: &KeyRecord) -> (String, Vec<BoundParam>) {
        let key_indexes = primary_key_indexes(self.columns);
        debug_assert!(!key_indexes.is_empty(), "tables are loaded with a primary key");

        let mut clauses = Vec::with_capacity(key_indexes.len());
        let mut params = Vec::with_capacity(key_indexes.len());
        for (position, index) in key_indexes.into_iter().enumerate() {
            let column = &self.columns[index];
            let name = param_name("pk_", column, index);
            clauses.push(format!("{} = {}", quote_identifier(&column.name), name));
            let value = key.values().get(position).and_then(|v| v.as_deref());
            params.push(BoundParam {
                name,
                value: self.bind(column, value),
            });
        }
        (clauses.join(" AND "), params)
    }

    /// Converts a display value to its bound form.
    ///
    /// Binary columns are encoded here and nowhere else. Null, and empty text
    /// on a nullable column, bind as SQL NULL.
    fn bind(&self, column: &ColumnDescriptor, value: Option<&str>) -> SqlValue {
        if column.is_binary() {
            return SqlValue::Bytes(display_to_payload(
                self.codec,
                value,
                self.binary_delimiter,
            ));
        }
        match value {
            None => SqlValue::Null,
            Some("") if column.nullable => SqlValue::Null,
            Some(text) => SqlValue::Text(text.to_string()),
        }
    }
}

/// Double-quotes an identifier, doubling any embedded quote.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn param_name(prefix: &str, column: &ColumnDescriptor, ordinal: usize) -> String {
    let sanitized: String = column
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("@{}{}_{}", prefix, sanitized, ordinal)
}
