//! Footer normalization
//!
//! Every produced sheet ends with a copyright line. Its year is brought up
//! to date and exactly one "As of: <date>" stamp is placed on that line,
//! right-aligned, styled like the copyright cell. Running the step twice
//! yields the same sheet.

use std::sync::OnceLock;

use pubtab_core::{CellValue, Grid, HorizontalAlign, MergeAnchorIndex, Vocabulary};
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FooterOutcome {
    pub copyright_row: u32,
    /// Cell holding the stamp
    pub stamp: (u32, u32),
    /// Stamp cells cleared before the new one was written
    pub removed: u32,
}

fn year_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("static pattern"))
}

/// Replace the last four-digit year in `text` with `year`.
pub fn rewrite_year(text: &str, year: i32) -> String {
    match year_pattern().find_iter(text).last() {
        Some(m) => format!("{}{}{}", &text[..m.start()], year, &text[m.end()..]),
        None => text.to_string(),
    }
}

/// Bottom-most row whose first column carries the copyright marker.
pub fn find_copyright_row<G: Grid + ?Sized>(grid: &G, vocab: &Vocabulary) -> Option<u32> {
    (1..=grid.max_row())
        .rev()
        .find(|&row| grid.text(row, 1).is_some_and(|t| vocab.is_copyright(&t)))
}

/// Right-most non-empty column within `window` rows above `row`.
fn rightmost_column_above<G: Grid + ?Sized>(grid: &G, row: u32, window: u32) -> Option<u32> {
    let top = row.saturating_sub(window).max(1);
    let max_col = grid.max_col();
    (top..row)
        .filter_map(|r| (1..=max_col).rev().find(|&c| !grid.value(r, c).is_empty()))
        .max()
}

/// Update the copyright year and place the single as-of stamp.
///
/// Returns `None` when the sheet has no copyright line; nothing is changed
/// then.
pub fn normalize_footer<G: Grid + ?Sized>(
    grid: &mut G,
    stand_text: &str,
    vocab: &Vocabulary,
    year: i32,
    window: u32,
) -> Option<FooterOutcome> {
    let row = find_copyright_row(&*grid, vocab)?;
    let anchors = MergeAnchorIndex::build(&*grid);
    let copyright = anchors.resolve(row, 1);

    if let Some(text) = grid.text(copyright.0, copyright.1) {
        let updated = rewrite_year(&text, year);
        if updated != text {
            grid.put_value(copyright.0, copyright.1, CellValue::Text(updated));
        }
    }

    let max_col = grid.max_col();
    let existing =
        (1..=max_col).find(|&col| grid.text(row, col).is_some_and(|t| vocab.is_stamp(&t)));

    let mut removed = 0;
    for r in 1..=grid.max_row() {
        for c in 1..=max_col {
            if grid.text(r, c).is_some_and(|t| vocab.is_stamp(&t)) {
                grid.put_value(r, c, CellValue::Empty);
                removed += 1;
            }
        }
    }

    let mut col = existing
        .or_else(|| rightmost_column_above(&*grid, row, window))
        .unwrap_or(max_col);
    if anchors.resolve(row, col) == copyright {
        // Never write over the copyright text; step past its merge.
        col = anchors
            .range_at(copyright.0, copyright.1)
            .map_or(copyright.1 + 1, |range| range.max_col + 1);
    }

    let stamp = anchors.resolve(row, col);
    grid.put_value(stamp.0, stamp.1, CellValue::Text(vocab.stamp(stand_text)));
    grid.copy_style(copyright, stamp);
    grid.set_align(stamp.0, stamp.1, HorizontalAlign::Right);

    tracing::debug!(row, col = stamp.1, removed, "footer normalized");
    Some(FooterOutcome {
        copyright_row: row,
        stamp,
        removed,
    })
}
