//! Raw workbook snapshots
//!
//! Raw inputs are read with calamine, which returns the cached result of
//! every formula cell. Each worksheet becomes an in-memory [`Sheet`] with
//! values at their real 1-based positions; styles and merges are not
//! carried, the engine only reads values from raw files.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use pubtab_core::{CellValue, Grid, PubtabError, RawWorkbook, Sheet};

fn workbook_error(path: &Path, message: impl ToString) -> PubtabError {
    PubtabError::Workbook {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Engine value of a calamine cell. Dates keep their serial number.
pub fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Read every worksheet of `path` as cached values.
pub fn read_raw(path: &Path) -> Result<RawWorkbook, PubtabError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    let names = workbook.sheet_names();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| workbook_error(path, format!("sheet '{name}': {e}")))?;

        let mut sheet = Sheet::new(name.as_str());
        // used_cells() is relative to the range origin, which need not be A1
        let (top, left) = range.start().unwrap_or((0, 0));
        for (row, col, data) in range.used_cells() {
            let value = cell_value(data);
            if !value.is_empty() {
                sheet.set(top + row as u32 + 1, left + col as u32 + 1, value);
            }
        }
        tracing::trace!(
            file = %path.display(),
            sheet = name.as_str(),
            rows = sheet.max_row(),
            cols = sheet.max_col(),
            "raw sheet loaded"
        );
        sheets.push(sheet);
    }
    Ok(RawWorkbook::new(sheets))
}
