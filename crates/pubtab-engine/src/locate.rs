//! Data block location
//!
//! A data block is the run of rows between the first data row (the
//! "Total" line, or failing that the first row with numbers) and the
//! footer (the first footnote line, or the copyright line). Raw sheets and
//! layout templates are located independently; transcription then pairs
//! their blocks row by row.
//!
//! Table kind 5 repeats its structure once per region. Each region starts
//! with a heading of the form `<Region> <n>)` and is located on its own.

use std::ops::RangeInclusive;
use std::sync::OnceLock;

use pubtab_core::{CellValue, DataStartRule, Grid, TableSpec, Vocabulary};
use regex::Regex;
use serde::Serialize;

/// Row extent of one data block
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DataBlock {
    /// `None` when neither a total label nor a numeric row was found
    pub first_data_row: Option<u32>,
    /// First row past the block (exclusive bound)
    pub footer_start_row: u32,
}

impl DataBlock {
    /// Number of data rows.
    pub fn len(&self) -> u32 {
        self.first_data_row
            .map_or(0, |first| self.footer_start_row.saturating_sub(first))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One region of a kind 5 sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegionBlock {
    /// Heading text without the footnote reference
    pub region: String,
    pub heading_row: u32,
    pub block: DataBlock,
}

/// Numbers, sentinels ("-", "X") and plain numeric text.
pub fn is_numeric_like(value: &CellValue, vocab: &Vocabulary) -> bool {
    match value {
        CellValue::Number(_) => true,
        CellValue::Text(text) => vocab.is_sentinel(text) || value.numeric().is_some(),
        CellValue::Empty => false,
    }
}

/// Whether `cols` of `row` hold a numeric-like cell. Callers pass the
/// column range once per sheet.
fn row_has_numbers<G: Grid + ?Sized>(
    grid: &G,
    row: u32,
    mut cols: RangeInclusive<u32>,
    vocab: &Vocabulary,
) -> bool {
    cols.any(|col| is_numeric_like(&grid.value(row, col), vocab))
}

/// First row of `rows` whose label columns hold the total label; failing
/// that, the first row with a numeric-like cell at or after `numeric_from`.
pub fn find_first_data_row<G: Grid + ?Sized>(
    grid: &G,
    rows: RangeInclusive<u32>,
    label_cols: RangeInclusive<u32>,
    numeric_from: u32,
    vocab: &Vocabulary,
) -> Option<u32> {
    let total = vocab.total.to_lowercase();
    let by_label = rows.clone().find(|&row| {
        label_cols.clone().any(|col| {
            grid.text(row, col)
                .is_some_and(|t| t.to_lowercase() == total)
        })
    });
    let numeric_cols = numeric_from..=grid.max_col();
    by_label.or_else(|| {
        rows.into_iter()
            .find(|&row| row_has_numbers(grid, row, numeric_cols.clone(), vocab))
    })
}

/// First footer row at or after `from_row`.
///
/// Footnote lines win over the copyright line; with neither, the footer
/// starts one past the last row.
pub fn find_footer_start<G: Grid + ?Sized>(
    grid: &G,
    from_row: u32,
    footnote_col: u32,
    vocab: &Vocabulary,
) -> u32 {
    let max_row = grid.max_row();
    let rows = from_row.max(1)..=max_row;

    let footnote = rows.clone().find(|&row| {
        grid.text(row, footnote_col)
            .is_some_and(|t| vocab.is_footnote(&t))
    });
    if let Some(row) = footnote {
        return row;
    }

    let max_col = grid.max_col();
    let copyright = rows.into_iter().find(|&row| {
        (1..=max_col).any(|col| {
            grid.text(row, col)
                .is_some_and(|t| vocab.is_copyright(&t))
        })
    });
    copyright.unwrap_or(max_row + 1)
}

/// Locate the single data block of a sheet.
pub fn locate_block<G: Grid + ?Sized>(grid: &G, spec: &TableSpec, vocab: &Vocabulary) -> DataBlock {
    let label_cols = match spec.data_start {
        DataStartRule::TotalLabel { label_cols, .. } => 1..=label_cols,
        DataStartRule::RegionBlocks { label_col, .. } => label_col..=label_col,
    };
    let first = find_first_data_row(
        grid,
        1..=grid.max_row(),
        label_cols,
        spec.data_start.numeric_from(),
        vocab,
    );
    DataBlock {
        first_data_row: first,
        footer_start_row: find_footer_start(grid, first.unwrap_or(1), spec.footnote_col, vocab),
    }
}

/// A block that starts at a known row (used when a layout has no total
/// label and no numbers yet).
pub fn block_from<G: Grid + ?Sized>(
    grid: &G,
    first_data_row: u32,
    spec: &TableSpec,
    vocab: &Vocabulary,
) -> DataBlock {
    DataBlock {
        first_data_row: Some(first_data_row),
        footer_start_row: find_footer_start(grid, first_data_row, spec.footnote_col, vocab),
    }
}

fn region_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(.+?)\s+\d+\)\s*$").expect("static pattern"))
}

/// Region name when `text` is a region heading ("Upper Bavaria 1)").
pub fn region_name(text: &str) -> Option<String> {
    region_heading()
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Split a kind 5 sheet into its region blocks.
///
/// A heading only counts on rows without numeric data, so data labels
/// carrying a footnote reference are not mistaken for regions. Returns an
/// empty list when the sheet has no headings (or the rule is not
/// `RegionBlocks`).
pub fn locate_region_blocks<G: Grid + ?Sized>(
    grid: &G,
    spec: &TableSpec,
    vocab: &Vocabulary,
) -> Vec<RegionBlock> {
    let DataStartRule::RegionBlocks {
        label_col,
        numeric_from,
    } = spec.data_start
    else {
        return Vec::new();
    };

    let numeric_cols = numeric_from..=grid.max_col();
    let headings: Vec<(u32, String)> = (1..=grid.max_row())
        .filter(|&row| !row_has_numbers(grid, row, numeric_cols.clone(), vocab))
        .filter_map(|row| {
            grid.text(row, label_col)
                .and_then(|t| region_name(&t))
                .map(|name| (row, name))
        })
        .collect();
    let Some(&(first_heading, _)) = headings.first() else {
        return Vec::new();
    };

    let footer = find_footer_start(grid, first_heading, spec.footnote_col, vocab);
    let mut blocks = Vec::new();
    for (idx, (row, region)) in headings.iter().enumerate() {
        if *row >= footer {
            break;
        }
        let end = headings
            .get(idx + 1)
            .map_or(footer, |(next, _)| (*next).min(footer));
        let first = (row + 1 < end)
            .then(|| {
                let rows = row + 1..=end - 1;
                find_first_data_row(grid, rows, label_col..=label_col, numeric_from, vocab)
            })
            .flatten();
        blocks.push(RegionBlock {
            region: region.clone(),
            heading_row: *row,
            block: DataBlock {
                first_data_row: first,
                footer_start_row: end,
            },
        });
    }
    blocks
}

// ============================================================================
// Tests
// ============================================================================
