//! Shared fixtures.

use rowsync_core::config::TableConfig;
use rowsync_core::persistence::SqliteStore;
use rowsync_core::table::RowHandle;
use rowsync_core::TableSession;

/// Opens an in-memory store initialized with `schema`.
pub fn create_store(schema: &str) -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.connection().execute_batch(schema).unwrap();
    store
}

/// Opens and loads a session over `table` with the given key columns.
pub fn create_loaded_session(
    schema: &str,
    table: &str,
    primary_keys: &[&str],
) -> TableSession<SqliteStore> {
    let mut session = TableSession::new(create_store(schema), TableConfig::new(table, primary_keys));
    session.load().unwrap();
    session
}

/// Handle of the first row whose cell `column` displays `value`.
pub fn find_row(session: &TableSession<SqliteStore>, column: usize, value: &str) -> RowHandle {
    session
        .working_set()
        .iter()
        .find(|(_, row, _)| row.display(column) == value)
        .map(|(handle, _, _)| handle)
        .unwrap_or_else(|| panic!("no row with {} in column {}", value, column))
}

/// Reads one column of `table` as text, ordered by `order_by`.
pub fn query_column(
    session: &TableSession<SqliteStore>,
    table: &str,
    column: &str,
    order_by: &str,
) -> Vec<Option<String>> {
    let sql = format!("SELECT CAST({} AS TEXT) FROM {} ORDER BY {}", column, table, order_by);
    let conn = session.store().connection();
    let mut stmt = conn.prepare(&sql).unwrap();
    let rows = stmt
        .query_map([], |r| r.get::<_, Option<String>>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}
