//! Save path tests: statement ordering, atomicity and reload.

use ntest::timeout;

use rowsync_core::table::RowState;
use rowsync_core::SyncError;

use super::helpers::{create_loaded_session, find_row, query_column};

const STOCK_SCHEMA: &str = "
    CREATE TABLE stock (
        sku VARCHAR(10) NOT NULL PRIMARY KEY,
        qty INTEGER NOT NULL CHECK (qty >= 0),
        label VARCHAR(5)
    );
    INSERT INTO stock VALUES ('S1', '10', 'one');
    INSERT INTO stock VALUES ('S2', '20', 'two');
    INSERT INTO stock VALUES ('S3', '30', NULL);
";

#[timeout(5000)]
#[test]
fn test_delete_then_insert_same_key_in_one_save() {
    let mut session = create_loaded_session(STOCK_SCHEMA, "stock", &["sku"]);

    let s1 = find_row(&session, 0, "S1");
    session.delete_rows(&[s1]).unwrap();
    let added = session.add_row().unwrap();
    session.set_cell_value(added, "sku", Some("S1".to_string())).unwrap();
    session.set_cell_value(added, "qty", Some("99".to_string())).unwrap();

    let summary = session.save().unwrap();

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.inserted, 1);
    assert_eq!(
        query_column(&session, "stock", "qty", "sku"),
        vec![
            Some("99".to_string()),
            Some("20".to_string()),
            Some("30".to_string()),
        ]
    );
    assert_eq!(
        query_column(&session, "stock", "label", "sku")[0],
        None,
        "empty nullable cell is stored as NULL"
    );
}

#[timeout(5000)]
#[test]
fn test_failed_statement_rolls_back_whole_save() {
    let mut session = create_loaded_session(STOCK_SCHEMA, "stock", &["sku"]);

    let s1 = find_row(&session, 0, "S1");
    let s2 = find_row(&session, 0, "S2");
    let s3 = find_row(&session, 0, "S3");
    session.delete_rows(&[s1]).unwrap();
    session.set_cell_value(s2, "qty", Some("21".to_string())).unwrap();
    // Passes validation but violates the CHECK constraint.
    session.set_cell_value(s3, "qty", Some("-1".to_string())).unwrap();

    let result = session.save();

    assert!(matches!(result, Err(SyncError::PersistenceFailure { .. })));
    assert_eq!(
        query_column(&session, "stock", "qty", "sku"),
        vec![
            Some("10".to_string()),
            Some("20".to_string()),
            Some("30".to_string()),
        ]
    );
    assert_eq!(session.working_set().state(s1), Some(RowState::DeletePending));
    assert_eq!(session.working_set().state(s2), Some(RowState::Modified));
    assert_eq!(session.working_set().state(s3), Some(RowState::Modified));
}

#[timeout(5000)]
#[test]
fn test_save_reloads_fresh_state() {
    let mut session = create_loaded_session(STOCK_SCHEMA, "stock", &["sku"]);

    let s2 = find_row(&session, 0, "S2");
    session.set_cell_value(s2, "label", Some("deux".to_string())).unwrap();
    session.save().unwrap();

    assert!(!session.has_unsaved_changes());
    assert_eq!(session.snapshot().len(), 3);
    let s2 = find_row(&session, 0, "S2");
    assert_eq!(session.working_set().row(s2).unwrap().display(2), "deux");
    assert_eq!(
        session.working_set().original_key(s2).unwrap().values(),
        &[Some("S2".to_string())]
    );
}

#[timeout(5000)]
#[test]
fn test_save_without_changes_is_harmless() {
    let mut session = create_loaded_session(STOCK_SCHEMA, "stock", &["sku"]);

    let summary = session.save().unwrap();

    assert_eq!(summary.rows_affected, 0);
    assert_eq!(summary.reloaded_rows, 3);
}

#[timeout(5000)]
#[test]
fn test_validation_blocks_long_value_before_any_write() {
    let mut session = create_loaded_session(STOCK_SCHEMA, "stock", &["sku"]);

    let s1 = find_row(&session, 0, "S1");
    let s2 = find_row(&session, 0, "S2");
    session.delete_rows(&[s1]).unwrap();
    session.set_cell_value(s2, "label", Some("toolong".to_string())).unwrap();

    match session.save() {
        Err(SyncError::ValidationFailure(violations)) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].column, "label");
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(query_column(&session, "stock", "sku", "sku").len(), 3);
}

#[timeout(5000)]
#[test]
fn test_identity_key_is_assigned_by_store() {
    let mut session = create_loaded_session(
        "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL);
         INSERT INTO notes (body) VALUES ('first');",
        "notes",
        &["id"],
    );
    assert!(session.columns()[0].identity);

    let added = session.add_row().unwrap();
    session.set_cell_value(added, "body", Some("second".to_string())).unwrap();
    session.save().unwrap();

    assert_eq!(
        query_column(&session, "notes", "id", "id"),
        vec![Some("1".to_string()), Some("2".to_string())]
    );
    assert_eq!(session.working_set().len(), 2);
}

#[timeout(5000)]
#[test]
fn test_binary_column_round_trip() {
    let mut session = create_loaded_session(
        "CREATE TABLE tagged (name TEXT NOT NULL PRIMARY KEY, tags BLOB);
         INSERT INTO tagged VALUES ('raw', X'FF00');
         INSERT INTO tagged VALUES ('none', NULL);",
        "tagged",
        &["name"],
    );

    let raw = find_row(&session, 0, "raw");
    let none = find_row(&session, 0, "none");
    assert_eq!(session.working_set().row(raw).unwrap().display(1), "255,0");
    assert_eq!(session.working_set().row(none).unwrap().display(1), "");

    session.set_cell_value(raw, "tags", Some("red,green".to_string())).unwrap();
    session.set_cell_value(none, "tags", Some("blue".to_string())).unwrap();
    session.save().unwrap();

    let payload: Vec<u8> = session
        .store()
        .connection()
        .query_row("SELECT tags FROM tagged WHERE name = 'raw'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(payload, br#"["red","green"]"#.to_vec());

    let raw = find_row(&session, 0, "raw");
    assert_eq!(session.working_set().row(raw).unwrap().display(1), "red,green");
}

#[timeout(5000)]
#[test]
fn test_composite_key_update_uses_original_key() {
    let mut session = create_loaded_session(
        "CREATE TABLE prices (code TEXT NOT NULL, region TEXT NOT NULL, price TEXT, PRIMARY KEY (code, region));
         INSERT INTO prices VALUES ('P', 'EU', '1.00');
         INSERT INTO prices VALUES ('P', 'US', '2.00');",
        "prices",
        &["code", "region"],
    );

    let us = find_row(&session, 1, "US");
    session.set_cell_value(us, "price", Some("2.50".to_string())).unwrap();
    let summary = session.save().unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.rows_affected, 1);
    assert_eq!(
        query_column(&session, "prices", "price", "region"),
        vec![Some("1.00".to_string()), Some("2.50".to_string())]
    );
}

#[timeout(5000)]
#[test]
fn test_unusual_identifiers_survive_load_and_save() {
    let mut session = create_loaded_session(
        r#"CREATE TABLE "odd]table" ("id" TEXT NOT NULL PRIMARY KEY, "we]ird" TEXT, "say ""hi""" TEXT);
           INSERT INTO "odd]table" VALUES ('1', 'a', 'x');
           INSERT INTO "odd]table" VALUES ('2', 'b', 'y');"#,
        "odd]table",
        &["id"],
    );
    assert_eq!(session.columns()[1].name, "we]ird");
    assert_eq!(session.columns()[2].name, r#"say "hi""#);

    let first = find_row(&session, 0, "1");
    let second = find_row(&session, 0, "2");
    session.set_cell_value(first, "we]ird", Some("changed".to_string())).unwrap();
    session.delete_rows(&[second]).unwrap();
    let added = session.add_row().unwrap();
    session.set_cell_value(added, "id", Some("3".to_string())).unwrap();
    session
        .set_cell_value(added, r#"say "hi""#, Some("z".to_string()))
        .unwrap();

    let summary = session.save().unwrap();

    assert_eq!((summary.inserted, summary.updated, summary.deleted), (1, 1, 1));
    assert_eq!(
        query_column(&session, r#""odd]table""#, r#""we]ird""#, "id"),
        vec![Some("changed".to_string()), None]
    );
    assert_eq!(
        query_column(&session, r#""odd]table""#, r#""say ""hi""""#, "id"),
        vec![Some("x".to_string()), Some("z".to_string())]
    );
}
