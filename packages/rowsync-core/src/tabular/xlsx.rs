//! `.xlsx` import via calamine and export via rust_xlsxwriter.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, Workbook};

use super::{
    missing_column_warning, ImportOutcome, ImportedRow, TabularError, TabularExporter,
    TabularImporter,
};
use crate::table::{ColumnDescriptor, RowRecord};

const HEADER_BACKGROUND: u32 = 0x1F497D;

/// Reads the first worksheet and writes a single worksheet.
///
/// Row 1 holds column names; data starts on row 2.
#[derive(Debug, Clone)]
pub struct XlsxTabular {
    /// Name given to the exported worksheet
    pub sheet_name: String,
}

impl Default for XlsxTabular {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
        }
    }
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) => f.to_string(),
        Some(other) => other.to_string(),
    }
}

impl TabularImporter for XlsxTabular {
    fn import_rows(
        &self,
        source: &Path,
        expected_columns: &[ColumnDescriptor],
    ) -> Result<ImportOutcome, TabularError> {
        let mut workbook =
            open_workbook_auto(source).map_err(|e| TabularError::Read(e.to_string()))?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(TabularError::NoWorksheet)?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| TabularError::Read(e.to_string()))?;

        let mut outcome = ImportOutcome::default();

        let (Some((start_row, start_col)), Some((end_row, end_col))) = (range.start(), range.end())
        else {
            outcome.warnings = expected_columns
                .iter()
                .map(|c| missing_column_warning(&c.name))
                .collect();
            return Ok(outcome);
        };

        // Header cells are on the first sheet row.
        let headers: Vec<(u32, String)> = (start_col..=end_col)
            .filter_map(|col| {
                let text = cell_text(range.get_value((0, col))).trim().to_string();
                (!text.is_empty()).then_some((col, text))
            })
            .collect();

        for column in expected_columns {
            if !headers.iter().any(|(_, h)| column.matches_name(h)) {
                outcome.warnings.push(missing_column_warning(&column.name));
            }
        }

        for row in start_row.max(1)..=end_row {
            let values: Vec<(&str, String)> = headers
                .iter()
                .map(|(col, header)| {
                    let text = cell_text(range.get_value((row, *col))).trim().to_string();
                    (header.as_str(), text)
                })
                .collect();

            if values.iter().all(|(_, v)| v.is_empty()) {
                continue;
            }
            outcome.rows.push(ImportedRow::from_pairs(values));
        }

        tracing::debug!(
            "Read {} rows from {} ({} warnings)",
            outcome.rows.len(),
            source.display(),
            outcome.warnings.len()
        );
        Ok(outcome)
    }
}

impl TabularExporter for XlsxTabular {
    fn export_rows(
        &self,
        destination: &Path,
        columns: &[ColumnDescriptor],
        rows: &[RowRecord],
    ) -> Result<(), TabularError> {
        let write_err = |e: rust_xlsxwriter::XlsxError| TabularError::Write(e.to_string());

        let mut workbook = Workbook::new();
        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(HEADER_BACKGROUND));

        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&self.sheet_name).map_err(write_err)?;

            for (index, column) in columns.iter().enumerate() {
                let col = u16::try_from(index)
                    .map_err(|_| TabularError::Write("too many columns".to_string()))?;
                worksheet
                    .write_string_with_format(0, col, &column.name, &header_format)
                    .map_err(write_err)?;
            }

            for (row_index, row) in rows.iter().enumerate() {
                let sheet_row = u32::try_from(row_index + 1)
                    .map_err(|_| TabularError::Write("too many rows".to_string()))?;
                for index in 0..columns.len() {
                    let value = row.display(index);
                    if value.is_empty() {
                        continue;
                    }
                    let col = u16::try_from(index)
                        .map_err(|_| TabularError::Write("too many columns".to_string()))?;
                    worksheet
                        .write_string(sheet_row, col, value)
                        .map_err(write_err)?;
                }
            }

            worksheet.autofit();
        }

        workbook.save(destination).map_err(write_err)?;
        tracing::debug!("Wrote {} rows to {}", rows.len(), destination.display());
        Ok(())
    }
}
