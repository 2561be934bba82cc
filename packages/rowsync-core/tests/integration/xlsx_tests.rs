//! Spreadsheet export and re-import.

use ntest::timeout;
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

use rowsync_core::tabular::{missing_column_warning, XlsxTabular};
use rowsync_core::SyncError;

use super::helpers::{create_loaded_session, find_row};

const FRUIT_SCHEMA: &str = "
    CREATE TABLE fruit (code TEXT NOT NULL PRIMARY KEY, name TEXT NOT NULL, note TEXT);
    INSERT INTO fruit VALUES ('A', 'apple', NULL);
    INSERT INTO fruit VALUES ('B', 'banana', 'yellow');
    INSERT INTO fruit VALUES ('C', 'cherry', 'red');
";

#[timeout(10000)]
#[test]
fn test_export_then_import_is_unchanged() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fruit.xlsx");
    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);
    let xlsx = XlsxTabular::default();

    assert_eq!(session.export_to(&xlsx, &path).unwrap(), 3);
    let summary = session.import_from(&xlsx, &path).unwrap();

    assert!(summary.warnings.is_empty());
    assert_eq!(summary.imported_rows, 3);
    assert_eq!(summary.states.unchanged, 3);
    assert!(!session.has_unsaved_changes());
}

#[timeout(10000)]
#[test]
fn test_export_skips_rows_pending_deletion() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fruit.xlsx");
    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);
    let xlsx = XlsxTabular::default();

    let b = find_row(&session, 0, "B");
    session.delete_rows(&[b]).unwrap();
    assert_eq!(session.export_to(&xlsx, &path).unwrap(), 2);

    session.reload_discarding_changes().unwrap();
    let summary = session.import_from(&xlsx, &path).unwrap();
    assert_eq!(summary.states.delete_pending, 1);
    assert_eq!(summary.states.unchanged, 2);
}

#[timeout(10000)]
#[test]
fn test_import_warns_about_missing_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "CODE").unwrap();
    sheet.write_string(0, 1, " Name ").unwrap();
    sheet.write_string(1, 0, "A").unwrap();
    sheet.write_string(1, 1, "apple").unwrap();
    sheet.write_string(2, 0, "D").unwrap();
    sheet.write_string(2, 1, "date").unwrap();
    workbook.save(&path).unwrap();

    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);
    let summary = session.import_from(&XlsxTabular::default(), &path).unwrap();

    assert_eq!(summary.warnings, vec![missing_column_warning("note")]);
    assert_eq!(summary.states.unchanged, 1);
    assert_eq!(summary.states.added, 1);
    assert_eq!(summary.states.delete_pending, 2);
}

#[timeout(10000)]
#[test]
fn test_import_unreadable_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a workbook").unwrap();

    let mut session = create_loaded_session(FRUIT_SCHEMA, "fruit", &["code"]);
    let result = session.import_from(&XlsxTabular::default(), &path);

    assert!(matches!(result, Err(SyncError::ImportParseFailure { .. })));
    assert_eq!(session.working_set().state_counts().unchanged, 3);
}
