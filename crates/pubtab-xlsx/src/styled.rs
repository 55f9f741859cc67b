//! Styled workbooks
//!
//! Layout templates and annual raw copies are edited in place with
//! umya-spreadsheet so fonts, borders, fills, column widths and merges
//! survive the round trip. [`XlsxSheet`] maps the engine's [`Grid`]
//! operations onto a worksheet.

use std::path::Path;

use pubtab_core::{
    CellValue, DisplayFormat, Grid, HorizontalAlign, MergeRange, PubtabError, StyledBook,
};
use umya_spreadsheet::{HorizontalAlignmentValues, Range, Spreadsheet, Worksheet};

/// An editable xlsx workbook
pub struct XlsxBook {
    book: Spreadsheet,
    group_separator: String,
}

impl XlsxBook {
    pub fn open(path: &Path, group_separator: impl Into<String>) -> Result<Self, PubtabError> {
        let book =
            umya_spreadsheet::reader::xlsx::read(path).map_err(|e| PubtabError::Workbook {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self {
            book,
            group_separator: group_separator.into(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PubtabError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        umya_spreadsheet::writer::xlsx::write(&self.book, path).map_err(|e| {
            PubtabError::Workbook {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }
}

impl StyledBook for XlsxBook {
    type Sheet<'a> = XlsxSheet<'a>;

    fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn sheet_mut(&mut self, index: usize) -> Option<XlsxSheet<'_>> {
        let group_separator = self.group_separator.as_str();
        self.book
            .get_sheet_mut(&index)
            .map(|ws| XlsxSheet::new(ws, group_separator))
    }
}

// ============================================================================
// Worksheet adapter
// ============================================================================

/// A worksheet seen as a [`Grid`].
///
/// Merges are read once when the adapter is created; the engine never
/// adds or removes merges, so the extent they contribute stays valid.
pub struct XlsxSheet<'a> {
    ws: &'a mut Worksheet,
    group_separator: &'a str,
    merges: Vec<MergeRange>,
    /// Highest (row, col) covered by any merge
    merge_extent: (u32, u32),
}

impl<'a> XlsxSheet<'a> {
    pub fn new(ws: &'a mut Worksheet, group_separator: &'a str) -> Self {
        let merges: Vec<MergeRange> = ws
            .get_merge_cells()
            .iter()
            .filter_map(merge_range)
            .collect();
        let merge_extent = merges
            .iter()
            .fold((0, 0), |(row, col), m| (row.max(m.max_row), col.max(m.max_col)));
        Self {
            ws,
            group_separator,
            merges,
            merge_extent,
        }
    }

    /// ARGB fill of a cell, if it has one.
    pub fn fill(&self, row: u32, col: u32) -> Option<String> {
        let cell = self.ws.get_cell((col, row))?;
        cell.get_style()
            .get_background_color()
            .map(|c| c.get_argb().to_string())
    }

    /// Number format code of a cell, if it has one.
    pub fn number_format(&self, row: u32, col: u32) -> Option<String> {
        let cell = self.ws.get_cell((col, row))?;
        cell.get_style()
            .get_number_format()
            .map(|f| f.get_format_code().to_string())
    }
}

/// Merge bounds from a umya range; a single-cell range has no end.
fn merge_range(range: &Range) -> Option<MergeRange> {
    let col_a = *range.get_coordinate_start_col()?.get_num();
    let row_a = *range.get_coordinate_start_row()?.get_num();
    let col_b = range.get_coordinate_end_col().map_or(col_a, |c| *c.get_num());
    let row_b = range.get_coordinate_end_row().map_or(row_a, |r| *r.get_num());
    Some(MergeRange::new(row_a, col_a, row_b, col_b))
}

fn horizontal(align: HorizontalAlign) -> HorizontalAlignmentValues {
    match align {
        HorizontalAlign::General => HorizontalAlignmentValues::General,
        HorizontalAlign::Left => HorizontalAlignmentValues::Left,
        HorizontalAlign::Center => HorizontalAlignmentValues::Center,
        HorizontalAlign::Right => HorizontalAlignmentValues::Right,
    }
}

impl Grid for XlsxSheet<'_> {
    fn name(&self) -> &str {
        self.ws.get_name()
    }

    fn max_row(&self) -> u32 {
        self.ws.get_highest_row().max(self.merge_extent.0)
    }

    fn max_col(&self) -> u32 {
        self.ws.get_highest_column().max(self.merge_extent.1)
    }

    fn value(&self, row: u32, col: u32) -> CellValue {
        let Some(cell) = self.ws.get_cell((col, row)) else {
            return CellValue::Empty;
        };
        if let Some(n) = cell.get_value_number() {
            return CellValue::Number(n);
        }
        let text = cell.get_value();
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text.into_owned())
        }
    }

    fn put_value(&mut self, row: u32, col: u32, value: CellValue) {
        match value {
            CellValue::Number(n) => {
                self.ws.get_cell_mut((col, row)).set_value_number(n);
            }
            CellValue::Text(text) => {
                self.ws.get_cell_mut((col, row)).set_value_string(text);
            }
            CellValue::Empty => {
                // never create a cell just to blank it
                if self.ws.get_cell((col, row)).is_some() {
                    self.ws.get_cell_mut((col, row)).set_blank();
                }
            }
        }
    }

    fn merges(&self) -> Vec<MergeRange> {
        self.merges.clone()
    }

    fn set_display(&mut self, row: u32, col: u32, format: DisplayFormat) {
        let value = self.value(row, col).numeric().unwrap_or_default();
        if let Some(code) = format.format_code(self.group_separator, value) {
            self.ws
                .get_cell_mut((col, row))
                .get_style_mut()
                .get_number_format_mut()
                .set_format_code(code);
        }
    }

    fn set_fill(&mut self, row: u32, col: u32, argb: &str) {
        self.ws
            .get_cell_mut((col, row))
            .get_style_mut()
            .set_background_color(argb);
    }

    fn copy_style(&mut self, from: (u32, u32), to: (u32, u32)) {
        let Some(style) = self
            .ws
            .get_cell((from.1, from.0))
            .map(|cell| cell.get_style().clone())
        else {
            return;
        };
        self.ws.get_cell_mut((to.1, to.0)).set_style(style);
    }

    fn set_align(&mut self, row: u32, col: u32, align: HorizontalAlign) {
        self.ws
            .get_cell_mut((col, row))
            .get_style_mut()
            .get_alignment_mut()
            .set_horizontal(horizontal(align));
    }
}
