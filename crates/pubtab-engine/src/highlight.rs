//! Review-row highlighting for public outputs

use pubtab_core::{CellValue, Grid};

/// Marker values 1 and 2, as numbers or as text.
pub fn is_review_marker(value: &CellValue) -> bool {
    match value {
        CellValue::Number(n) => *n == 1.0 || *n == 2.0,
        CellValue::Text(t) => matches!(t.trim(), "1" | "2"),
        CellValue::Empty => false,
    }
}

/// Fill every flagged row across the used width. Returns the number of
/// rows filled; applying it again yields the same sheet.
pub fn highlight_rows<G: Grid + ?Sized>(grid: &mut G, marker_col: u32, argb: &str) -> usize {
    let width = grid.used_width().max(marker_col);
    let rows: Vec<u32> = (1..=grid.max_row())
        .filter(|&row| is_review_marker(&grid.value(row, marker_col)))
        .collect();

    for &row in &rows {
        for col in 1..=width {
            grid.set_fill(row, col, argb);
        }
    }
    rows.len()
}
