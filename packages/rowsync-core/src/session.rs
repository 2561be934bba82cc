//! Table maintenance session.
//!
//! Owns the working set and original snapshot for one table and drives the
//! load → edit → validate → save cycle and spreadsheet import/export.

use std::path::Path;

use crate::codec::{payload_to_display, BinaryCodec, JsonListCodec};
use crate::config::{SessionConfig, TableConfig};
use crate::error::SyncError;
use crate::persistence::{RowStore, SchemaProvider};
use crate::reconcile::reconcile;
use crate::table::{
    column_index, validate, CellEdit, ColumnDescriptor, DeleteOutcome, KeyRecord,
    OriginalSnapshot, RowHandle, RowRecord, RowState, StateCounts, Violation, WorkingSet,
};
use crate::tabular::{ImportOutcome, TabularExporter, TabularImporter};
use crate::transaction::{ChangeSet, SqlSynthesizer, SqlValue};

/// Counts from a completed save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Rows affected as reported by the store
    pub rows_affected: usize,
    /// Rows present after the post-save reload
    pub reloaded_rows: usize,
}

/// Counts from a completed import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Data rows read from the source
    pub imported_rows: usize,
    /// Working-set states after reconciliation
    pub states: StateCounts,
    /// Non-fatal problems reported by the importer
    pub warnings: Vec<String>,
    /// False when the import had no rows and the working set was kept
    pub applied: bool,
}

/// Counts from deleting a selection of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Never-persisted rows removed outright
    pub removed: usize,
    /// Persisted rows marked for deletion
    pub marked: usize,
}

/// Editing session over one table.
pub struct TableSession<S> {
    store: S,
    table: TableConfig,
    config: SessionConfig,
    codec: Box<dyn BinaryCodec>,
    columns: Vec<ColumnDescriptor>,
    working_set: WorkingSet,
    snapshot: OriginalSnapshot,
    loaded: bool,
}

impl<S: SchemaProvider + RowStore> TableSession<S> {
    /// Creates a session with default settings and the JSON list codec.
    pub fn new(store: S, table: TableConfig) -> Self {
        Self::with_config(store, table, SessionConfig::default())
    }

    /// Creates a session with explicit settings.
    pub fn with_config(store: S, table: TableConfig, config: SessionConfig) -> Self {
        let snapshot = OriginalSnapshot::new(config.key_separator);
        Self {
            store,
            table,
            config,
            codec: Box::new(JsonListCodec),
            columns: Vec::new(),
            working_set: WorkingSet::default(),
            snapshot,
            loaded: false,
        }
    }

    /// Replaces the binary column codec.
    pub fn with_codec(mut self, codec: Box<dyn BinaryCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Loads the table from storage, replacing the working set and snapshot.
    ///
    /// Columns and rows are fully read before anything is replaced, so a
    /// failed load leaves the previous session state intact.
    ///
    /// # Returns
    /// `Result<usize, SyncError>` with the number of rows loaded.
    pub fn load(&mut self) -> Result<usize, SyncError> {
        let name = self.table.name.clone();
        tracing::debug!("Loading table {}", name);

        let columns = self
            .store
            .get_columns(&name, &self.table.primary_keys)
            .map_err(|e| SyncError::SchemaLookupFailure {
                table: name.clone(),
                reason: e.to_string(),
            })?;
        self.check_primary_keys(&columns)?;

        let fetched = self
            .store
            .fetch_all(&name, &columns)
            .map_err(|e| SyncError::LoadFailure {
                table: name.clone(),
                reason: e.to_string(),
            })?;

        let mut working_set = WorkingSet::new(columns.len());
        let mut snapshot = OriginalSnapshot::new(self.config.key_separator);

        for (row_number, values) in fetched.into_iter().enumerate() {
            if values.len() != columns.len() {
                return Err(SyncError::LoadFailure {
                    table: name,
                    reason: format!(
                        "row {} has {} values, expected {}",
                        row_number + 1,
                        values.len(),
                        columns.len()
                    ),
                });
            }

            let cells = columns
                .iter()
                .zip(values)
                .map(|(column, value)| self.to_display(column, value))
                .collect();
            let record = RowRecord::from_cells(cells);
            let key = KeyRecord::capture(&columns, &record);
            snapshot.push(&columns, record.clone());
            working_set.push_persisted(record, RowState::Unchanged, key);
        }

        let count = working_set.len();
        self.columns = columns;
        self.working_set = working_set;
        self.snapshot = snapshot;
        self.loaded = true;

        tracing::info!("Loaded {} rows from {}", count, name);
        Ok(count)
    }

    /// Reloads from storage, discarding unsaved changes.
    pub fn reload_discarding_changes(&mut self) -> Result<usize, SyncError> {
        if self.has_unsaved_changes() {
            let counts = self.working_set.state_counts();
            tracing::warn!(
                "Discarding {} unsaved changes to {}",
                counts.modified + counts.added + counts.delete_pending,
                self.table.name
            );
        }
        self.load()
    }

    /// Drops all loaded state; only a fresh [`Self::load`] makes the session usable again.
    fn clear(&mut self) {
        self.columns.clear();
        self.working_set = WorkingSet::default();
        self.snapshot = OriginalSnapshot::new(self.config.key_separator);
        self.loaded = false;
    }

    fn check_primary_keys(&self, columns: &[ColumnDescriptor]) -> Result<(), SyncError> {
        let failure = |reason: String| SyncError::SchemaLookupFailure {
            table: self.table.name.clone(),
            reason,
        };

        if self.table.primary_keys.is_empty() {
            return Err(failure("no primary key columns configured".to_string()));
        }
        for key in &self.table.primary_keys {
            if column_index(columns, key).is_none() {
                return Err(failure(format!("primary key column '{}' not found", key)));
            }
        }
        Ok(())
    }

    /// Converts a fetched value to working-set display form.
    fn to_display(&self, column: &ColumnDescriptor, value: SqlValue) -> Option<String> {
        if column.is_binary() {
            let payload = match &value {
                SqlValue::Null => None,
                SqlValue::Text(text) => Some(text.as_bytes()),
                SqlValue::Bytes(bytes) => Some(bytes.as_slice()),
            };
            let (display, fallback) =
                payload_to_display(self.codec.as_ref(), payload, self.config.binary_delimiter);
            if fallback {
                tracing::warn!(
                    "Column {}.{} holds an unreadable binary payload; showing raw bytes",
                    self.table.name,
                    column.name
                );
            }
            return Some(display);
        }

        match value {
            SqlValue::Null => None,
            SqlValue::Text(text) => Some(text),
            SqlValue::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    fn ensure_loaded(&self) -> Result<(), SyncError> {
        if self.loaded {
            Ok(())
        } else {
            Err(SyncError::NoTableLoaded)
        }
    }

    /// Table configuration.
    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    /// Column descriptors of the loaded table.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Current working set.
    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    /// Storage contents at the last load.
    pub fn snapshot(&self) -> &OriginalSnapshot {
        &self.snapshot
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns true once a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns true if any row differs from storage.
    pub fn has_unsaved_changes(&self) -> bool {
        self.working_set.has_unsaved_changes()
    }

    /// Appends an empty `Added` row.
    pub fn add_row(&mut self) -> Result<RowHandle, SyncError> {
        self.ensure_loaded()?;
        Ok(self.working_set.mark_added(None))
    }

    /// Starts a single-cell edit; see [`WorkingSet::begin_edit`].
    pub fn begin_edit(&mut self, handle: RowHandle, column: &str) -> Result<CellEdit<'_>, SyncError> {
        self.ensure_loaded()?;
        self.working_set.begin_edit(&self.columns, handle, column)
    }

    /// Writes one cell.
    ///
    /// # Returns
    /// The row state after the edit.
    pub fn set_cell_value(
        &mut self,
        handle: RowHandle,
        column: &str,
        value: Option<String>,
    ) -> Result<RowState, SyncError> {
        self.ensure_loaded()?;
        self.working_set
            .set_cell_value(&self.columns, handle, column, value)
    }

    /// Deletes a selection of rows.
    ///
    /// `Added` rows are removed, persisted rows are marked pending deletion.
    pub fn delete_rows(&mut self, handles: &[RowHandle]) -> Result<DeleteSummary, SyncError> {
        self.ensure_loaded()?;
        let mut summary = DeleteSummary::default();
        for handle in handles {
            match self.working_set.mark_delete_pending(*handle)? {
                DeleteOutcome::Removed => summary.removed += 1,
                DeleteOutcome::MarkedPending => summary.marked += 1,
                DeleteOutcome::AlreadyPending => {}
            }
        }
        Ok(summary)
    }

    /// Checks edited and added rows against column constraints.
    pub fn validate(&self) -> Vec<Violation> {
        validate(&self.working_set, &self.columns)
    }

    /// Partitions the working set into inserts, updates and deletes.
    pub fn build_change_set(&self) -> ChangeSet {
        ChangeSet::build(&self.working_set, &self.columns)
    }

    /// Validates, persists every change atomically, then reloads.
    ///
    /// On validation failure nothing is written. On persistence failure the
    /// store has rolled back and the working set is left as it was.
    pub fn save(&mut self) -> Result<SaveSummary, SyncError> {
        self.ensure_loaded()?;

        let violations = self.validate();
        if !violations.is_empty() {
            tracing::debug!(
                "Save of {} blocked by {} validation problems",
                self.table.name,
                violations.len()
            );
            return Err(SyncError::ValidationFailure(violations));
        }

        let changes = self.build_change_set();
        let statements = SqlSynthesizer::new(
            &self.table.name,
            &self.columns,
            self.codec.as_ref(),
            self.config.binary_delimiter,
        )
        .plan(&changes);

        let rows_affected = self
            .store
            .apply_changes(&self.table.name, &statements)
            .map_err(|e| {
                tracing::error!("Save of {} rolled back: {}", self.table.name, e);
                SyncError::PersistenceFailure {
                    table: self.table.name.clone(),
                    reason: e.to_string(),
                }
            })?;

        tracing::info!(
            "Saved {} (inserted: {}, updated: {}, deleted: {})",
            self.table.name,
            changes.inserts.len(),
            changes.updates.len(),
            changes.deletes.len()
        );

        // The batch is committed; stale labels must not be saved twice.
        let reloaded_rows = match self.load() {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(
                    "Reload of {} after save failed, session cleared: {}",
                    self.table.name,
                    e
                );
                self.clear();
                return Err(e);
            }
        };
        Ok(SaveSummary {
            inserted: changes.inserts.len(),
            updated: changes.updates.len(),
            deleted: changes.deletes.len(),
            rows_affected,
            reloaded_rows,
        })
    }

    /// Replaces the working set with imported rows reconciled against the
    /// original snapshot. Unsaved edits are discarded.
    pub fn import_rows(&mut self, outcome: ImportOutcome) -> Result<ImportSummary, SyncError> {
        self.ensure_loaded()?;

        for warning in &outcome.warnings {
            tracing::warn!("Import into {}: {}", self.table.name, warning);
        }

        if outcome.rows.is_empty() && self.config.ignore_empty_import {
            tracing::info!("Import into {} had no rows; nothing changed", self.table.name);
            return Ok(ImportSummary {
                imported_rows: 0,
                states: self.working_set.state_counts(),
                warnings: outcome.warnings,
                applied: false,
            });
        }

        self.working_set = reconcile(&self.columns, &outcome.rows, &self.snapshot);
        let states = self.working_set.state_counts();
        tracing::info!(
            "Imported {} rows into {} (added: {}, modified: {}, unchanged: {}, delete pending: {})",
            outcome.rows.len(),
            self.table.name,
            states.added,
            states.modified,
            states.unchanged,
            states.delete_pending
        );

        Ok(ImportSummary {
            imported_rows: outcome.rows.len(),
            states,
            warnings: outcome.warnings,
            applied: true,
        })
    }

    /// Reads `source` with `importer` and reconciles it; see [`Self::import_rows`].
    pub fn import_from(
        &mut self,
        importer: &dyn TabularImporter,
        source: &Path,
    ) -> Result<ImportSummary, SyncError> {
        self.ensure_loaded()?;
        let outcome = importer
            .import_rows(source, &self.columns)
            .map_err(|e| SyncError::ImportParseFailure {
                source_name: source.display().to_string(),
                reason: e.to_string(),
            })?;
        self.import_rows(outcome)
    }

    /// Rows to export: every row not pending deletion, in visible order.
    pub fn export_rows(&self) -> Vec<RowRecord> {
        self.working_set
            .iter()
            .filter(|(_, _, state)| *state != RowState::DeletePending)
            .map(|(_, row, _)| row.clone())
            .collect()
    }

    /// Writes [`Self::export_rows`] to `destination`.
    ///
    /// # Returns
    /// Number of rows written.
    pub fn export_to(
        &self,
        exporter: &dyn TabularExporter,
        destination: &Path,
    ) -> Result<usize, SyncError> {
        self.ensure_loaded()?;
        let rows = self.export_rows();
        exporter
            .export_rows(destination, &self.columns, &rows)
            .map_err(|e| SyncError::ExportFailure {
                destination: destination.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!("Exported {} rows of {}", rows.len(), self.table.name);
        Ok(rows.len())
    }
}
