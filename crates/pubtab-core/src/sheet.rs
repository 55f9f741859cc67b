//! Sheet model and the `Grid` trait
//!
//! All coordinates are 1-based `(row, col)`, as in the workbook UI.
//! Backends (the in-memory `Sheet`, the xlsx adapter) implement `Grid`;
//! the engine only ever talks to `Grid`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Values
// ============================================================================

/// A cell value as seen by the engine (cached values only, never formulas)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Empty cells and whitespace-only text count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// Trimmed, non-empty text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then_some(t)
            }
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value, also accepting text that is a plain number ("1234", "-12.5").
    pub fn numeric(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_number(s),
            CellValue::Empty => None,
        }
    }

    /// Text rendering without any display format applied.
    pub fn to_plain_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Parse text holding a plain decimal number.
///
/// Grouped numbers ("1 234") and locale decimals ("12,5") are not numbers
/// here; raw sheets deliver those as already-formatted labels.
pub fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() || !t.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if !t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// Styles
// ============================================================================

/// Display rule attached to a cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayFormat {
    #[default]
    Plain,
    /// Rounded integer, thousands grouped, "- " before negatives
    IntegerGrouped,
    /// One decimal, bare "0" for exact zero, no percent sign
    PercentOneDecimal,
}

impl DisplayFormat {
    /// Spreadsheet number format code for a cell holding `value`; `None`
    /// keeps the cell's own format.
    ///
    /// Spreadsheet applications only treat `,` as a grouping token, so any
    /// other separator is written as a literal between digit placeholders.
    /// Literals sit at fixed positions, which is why the integer code is
    /// sized to the digit count of the (rounded) value.
    pub fn format_code(&self, group_separator: &str, value: f64) -> Option<String> {
        match self {
            DisplayFormat::Plain => None,
            DisplayFormat::IntegerGrouped => {
                let grouped = integer_pattern(value, group_separator);
                Some(format!("{grouped};\"- \"{grouped};0"))
            }
            DisplayFormat::PercentOneDecimal => Some("0.0;-0.0;0".to_string()),
        }
    }
}

/// `#` placeholders, one per digit, ending in `0`, with the separator
/// between groups of three ("# ### ##0" for seven digits).
fn integer_pattern(value: f64, group_separator: &str) -> String {
    if group_separator == "," {
        return "#,##0".to_string();
    }
    let literal = match group_separator {
        "" | " " => group_separator.to_string(),
        other => format!("\"{other}\""),
    };
    let digits = format!("{}", value.abs().round() as u64).len();
    let mut pattern = String::new();
    for idx in 0..digits {
        if idx > 0 && (digits - idx) % 3 == 0 {
            pattern.push_str(&literal);
        }
        pattern.push(if idx + 1 == digits { '0' } else { '#' });
    }
    pattern
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
}

/// The subset of cell styling the engine reads or writes
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub display: DisplayFormat,
    /// ARGB fill colour, e.g. `FFFFFF99`
    pub fill: Option<String>,
    pub align: HorizontalAlign,
    pub bold: bool,
    pub italic: bool,
    pub border: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

// ============================================================================
// Merge ranges
// ============================================================================

/// Rectangular merged region; only the anchor (top-left) cell carries a value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRange {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl MergeRange {
    /// Create a range from two corners in any order.
    pub fn new(row_a: u32, col_a: u32, row_b: u32, col_b: u32) -> Self {
        Self {
            min_row: row_a.min(row_b),
            min_col: col_a.min(col_b),
            max_row: row_a.max(row_b),
            max_col: col_a.max(col_b),
        }
    }

    pub fn anchor(&self) -> (u32, u32) {
        (self.min_row, self.min_col)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.min_row..=self.max_row).contains(&row) && (self.min_col..=self.max_col).contains(&col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.min_row == self.max_row && self.min_col == self.max_col
    }

    /// Every `(row, col)` inside the range, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.min_row..=self.max_row)
            .flat_map(move |r| (self.min_col..=self.max_col).map(move |c| (r, c)))
    }
}

// ============================================================================
// Grid trait
// ============================================================================

/// A mutable worksheet as the engine sees it.
///
/// `put_value` is the raw, merge-unaware write; callers that may target
/// merged cells go through [`crate::MergeAnchorIndex::write`].
pub trait Grid {
    fn name(&self) -> &str;

    /// Highest row holding a value or style
    fn max_row(&self) -> u32;

    /// Highest column holding a value or style
    fn max_col(&self) -> u32;

    fn value(&self, row: u32, col: u32) -> CellValue;

    fn put_value(&mut self, row: u32, col: u32, value: CellValue);

    fn merges(&self) -> Vec<MergeRange>;

    fn set_display(&mut self, row: u32, col: u32, format: DisplayFormat);

    fn set_fill(&mut self, row: u32, col: u32, argb: &str);

    /// Copy font, border, fill and number format from one cell to another.
    fn copy_style(&mut self, from: (u32, u32), to: (u32, u32));

    fn set_align(&mut self, row: u32, col: u32, align: HorizontalAlign);

    /// Trimmed non-empty text at a cell.
    fn text(&self, row: u32, col: u32) -> Option<String> {
        self.value(row, col).as_text().map(str::to_string)
    }

    /// Right-most column holding a non-empty value anywhere in the sheet.
    fn used_width(&self) -> u32 {
        let (max_row, max_col) = (self.max_row(), self.max_col());
        let mut width = 0;
        for row in 1..=max_row {
            for col in (width + 1..=max_col).rev() {
                if !self.value(row, col).is_empty() {
                    width = col;
                    break;
                }
            }
        }
        width
    }
}

impl<G: Grid + ?Sized> Grid for &mut G {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_row(&self) -> u32 {
        (**self).max_row()
    }

    fn max_col(&self) -> u32 {
        (**self).max_col()
    }

    fn value(&self, row: u32, col: u32) -> CellValue {
        (**self).value(row, col)
    }

    fn put_value(&mut self, row: u32, col: u32, value: CellValue) {
        (**self).put_value(row, col, value);
    }

    fn merges(&self) -> Vec<MergeRange> {
        (**self).merges()
    }

    fn set_display(&mut self, row: u32, col: u32, format: DisplayFormat) {
        (**self).set_display(row, col, format);
    }

    fn set_fill(&mut self, row: u32, col: u32, argb: &str) {
        (**self).set_fill(row, col, argb);
    }

    fn copy_style(&mut self, from: (u32, u32), to: (u32, u32)) {
        (**self).copy_style(from, to);
    }

    fn set_align(&mut self, row: u32, col: u32, align: HorizontalAlign) {
        (**self).set_align(row, col, align);
    }
}

// ============================================================================
// In-memory sheet
// ============================================================================

/// In-memory worksheet.
///
/// Used for cached-value snapshots of raw workbooks and as the test double
/// for styled templates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    merges: Vec<MergeRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    /// Build a sheet from row-major values starting at A1.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = Self::new(name);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                if value != CellValue::Empty {
                    sheet.set(r as u32 + 1, c as u32 + 1, value);
                }
            }
        }
        sheet
    }

    /// Set a value (raw write, no merge resolution).
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<CellValue>) -> &mut Self {
        self.cells.entry((row, col)).or_default().value = value.into();
        self
    }

    pub fn merge(&mut self, range: MergeRange) -> &mut Self {
        self.merges.push(range);
        self
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn style(&self, row: u32, col: u32) -> CellStyle {
        self.cells
            .get(&(row, col))
            .map(|c| c.style.clone())
            .unwrap_or_default()
    }

    pub fn style_mut(&mut self, row: u32, col: u32) -> &mut CellStyle {
        &mut self.cells.entry((row, col)).or_default().style
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Cells holding a non-empty value, row-major.
    pub fn filled_cells(&self) -> impl Iterator<Item = ((u32, u32), &CellValue)> {
        self.cells
            .iter()
            .filter(|(_, cell)| !cell.value.is_empty())
            .map(|(pos, cell)| (*pos, &cell.value))
    }
}

impl Grid for Sheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_row(&self) -> u32 {
        let cells = self.cells.keys().next_back().map_or(0, |(r, _)| *r);
        let merged = self.merges.iter().map(|m| m.max_row).max().unwrap_or(0);
        cells.max(merged)
    }

    fn max_col(&self) -> u32 {
        let cells = self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0);
        let merged = self.merges.iter().map(|m| m.max_col).max().unwrap_or(0);
        cells.max(merged)
    }

    fn value(&self, row: u32, col: u32) -> CellValue {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    fn put_value(&mut self, row: u32, col: u32, value: CellValue) {
        if value == CellValue::Empty && !self.cells.contains_key(&(row, col)) {
            return;
        }
        self.set(row, col, value);
    }

    fn merges(&self) -> Vec<MergeRange> {
        self.merges.clone()
    }

    fn set_display(&mut self, row: u32, col: u32, format: DisplayFormat) {
        self.style_mut(row, col).display = format;
    }

    fn set_fill(&mut self, row: u32, col: u32, argb: &str) {
        self.style_mut(row, col).fill = Some(argb.to_string());
    }

    fn copy_style(&mut self, from: (u32, u32), to: (u32, u32)) {
        let style = self.style(from.0, from.1);
        *self.style_mut(to.0, to.1) = style;
    }

    fn set_align(&mut self, row: u32, col: u32, align: HorizontalAlign) {
        self.style_mut(row, col).align = align;
    }
}

// ============================================================================
// Tests
// ============================================================================
