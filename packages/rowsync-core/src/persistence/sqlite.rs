//! SQLite-backed schema provider and row store.

use std::path::Path;
use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::Connection;

use super::{RowStore, SchemaProvider, StoreError};
use crate::table::ColumnDescriptor;
use crate::transaction::{quote_identifier, SqlValue, Statement};

/// Schema provider and row store over one SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Splits a declared type such as `VARCHAR(20)` into its tag and length.
fn parse_declared_type(declared: &str) -> (String, Option<i64>) {
    let declared = declared.trim();
    match declared.find('(') {
        Some(open) => {
            let tag = declared[..open].trim().to_ascii_lowercase();
            let args = declared[open + 1..].trim_end_matches(')');
            let length = args
                .split(',')
                .next()
                .and_then(|len| len.trim().parse::<i64>().ok());
            (tag, length)
        }
        None => (declared.to_ascii_lowercase(), None),
    }
}

/// Character types whose declared length is enforced before saving.
fn is_character_type(tag: &str) -> bool {
    tag.contains("char") || tag.contains("text") || tag.contains("clob")
}

impl SchemaProvider for SqliteStore {
    fn get_columns(
        &self,
        table: &str,
        primary_keys: &[String],
    ) -> Result<Vec<ColumnDescriptor>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")?;
        let raw = stmt
            .query_map([table], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if raw.is_empty() {
            return Err(StoreError::TableNotFound(table.to_string()));
        }

        // A lone INTEGER PRIMARY KEY aliases the rowid and is server-assigned.
        let declared_pk_count = raw.iter().filter(|(_, _, _, pk)| *pk > 0).count();

        let columns = raw
            .into_iter()
            .map(|(name, declared, not_null, pk)| {
                let (type_tag, length) = parse_declared_type(&declared);
                let identity = pk > 0 && declared_pk_count == 1 && type_tag == "integer";
                let primary_key = primary_keys.iter().any(|k| k.eq_ignore_ascii_case(&name));
                ColumnDescriptor {
                    nullable: not_null == 0 && pk == 0,
                    max_length: length.filter(|_| is_character_type(&type_tag)),
                    identity,
                    primary_key,
                    name,
                    type_tag,
                }
            })
            .collect();

        Ok(columns)
    }
}

impl RowStore for SqliteStore {
    fn fetch_all(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<Vec<Vec<SqlValue>>, StoreError> {
        let select_list: Vec<String> = columns.iter().map(|c| quote_identifier(&c.name)).collect();
        let sql = format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            quote_identifier(table)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |r| {
                (0..columns.len())
                    .map(|i| r.get_ref(i).map(value_from_sql))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    fn apply_changes(&mut self, table: &str, statements: &[Statement]) -> Result<usize, StoreError> {
        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.transaction()?;
        let mut affected = 0;

        for statement in statements {
            let params: Vec<(&str, &dyn ToSql)> = statement
                .params
                .iter()
                .map(|p| (p.name.as_str(), &p.value as &dyn ToSql))
                .collect();

            affected += tx
                .execute(&statement.sql, params.as_slice())
                .map_err(|e| StoreError::StatementFailed {
                    sql: statement.sql.clone(),
                    message: e.to_string(),
                })?;
        }

        tx.commit()?;
        tracing::debug!(
            "Applied {} statements to {} ({} rows affected)",
            statements.len(),
            table,
            affected
        );
        Ok(affected)
    }
}

fn value_from_sql(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Text(i.to_string()),
        ValueRef::Real(f) => SqlValue::Text(f.to_string()),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Bytes(b.to_vec()),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            SqlValue::Bytes(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes.as_slice())),
        })
    }
}
