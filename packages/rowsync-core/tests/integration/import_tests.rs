//! Import reconciliation through a loaded session.

use ntest::timeout;

use rowsync_core::config::{SessionConfig, TableConfig};
use rowsync_core::table::RowState;
use rowsync_core::tabular::{ImportOutcome, ImportedRow};
use rowsync_core::TableSession;

use super::helpers::{create_loaded_session, create_store, find_row, query_column};

const FRUIT_SCHEMA: &str = "
    CREATE TABLE fruit (code TEXT NOT NULL PRIMARY KEY, name TEXT NOT NULL, note TEXT);
    INSERT INTO fruit VALUES ('A', 'apple', NULL);
    INSERT INTO fruit VALUES ('B', 'banana', 'yellow');
";

fn outcome(rows: &[[&str; 3]]) -> ImportOutcome {
    ImportOutcome {
        rows: rows
            .iter()
            .map(|[code, name, note]| {
                ImportedRow::from_pairs([("Code", *code), ("Name", *name), ("Note", *note)])
            })
            .collect(),
        warnings: Vec::new(),
    }
}

#[timeout(5000)]
#[test]
fn test_import_then_save_applies_diff() {
    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);

    let summary = session
        .import_rows(outcome(&[["A", "apricot", ""], ["C", "cherry", "red"]]))
        .unwrap();
    assert_eq!(summary.imported_rows, 2);
    assert_eq!(summary.states.modified, 1);
    assert_eq!(summary.states.added, 1);
    assert_eq!(summary.states.delete_pending, 1);

    let saved = session.save().unwrap();
    assert_eq!((saved.inserted, saved.updated, saved.deleted), (1, 1, 1));
    assert_eq!(
        query_column(&session, "fruit", "name", "code"),
        vec![Some("apricot".to_string()), Some("cherry".to_string())]
    );
}

#[timeout(5000)]
#[test]
fn test_import_identical_rows_has_nothing_to_save() {
    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);

    session
        .import_rows(outcome(&[["A", "apple", ""], ["B", "banana", "yellow"]]))
        .unwrap();

    assert!(!session.has_unsaved_changes());
    assert!(session.build_change_set().is_empty());
}

#[timeout(5000)]
#[test]
fn test_import_discards_previous_edits() {
    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);
    let a = find_row(&session, 0, "A");
    session.set_cell_value(a, "name", Some("avocado".to_string())).unwrap();
    session.add_row().unwrap();

    session
        .import_rows(outcome(&[["A", "apple", ""], ["B", "banana", "yellow"]]))
        .unwrap();

    assert_eq!(session.working_set().len(), 2);
    let a = find_row(&session, 0, "A");
    assert_eq!(session.working_set().row(a).unwrap().display(1), "apple");
    assert_eq!(session.working_set().state(a), Some(RowState::Unchanged));
}

#[timeout(5000)]
#[test]
fn test_import_rows_allow_key_edit_only_when_added() {
    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);
    session
        .import_rows(outcome(&[["A", "apple", ""], ["Z", "zucchini", ""]]))
        .unwrap();

    let a = find_row(&session, 0, "A");
    let z = find_row(&session, 0, "Z");

    assert!(session.set_cell_value(a, "code", Some("X".to_string())).is_err());
    assert_eq!(
        session.set_cell_value(z, "code", Some("Y".to_string())).unwrap(),
        RowState::Added
    );
}

#[timeout(5000)]
#[test]
fn test_empty_import_can_clear_table_when_configured() {
    let config = SessionConfig {
        ignore_empty_import: false,
        ..Default::default()
    };
    let mut session = TableSession::with_config(
        create_store(FRUIT_SCHEMA),
        TableConfig::new("fruit", &["code"]),
        config,
    );
    session.load().unwrap();

    let summary = session.import_rows(ImportOutcome::default()).unwrap();

    assert!(summary.applied);
    assert_eq!(summary.states.delete_pending, 2);
    session.save().unwrap();
    assert!(session.working_set().is_empty());
}
