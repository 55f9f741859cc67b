//! Row-by-row value transfer from a raw block into a layout block

use std::ops::RangeInclusive;

use pubtab_core::{Grid, MergeAnchorIndex};

use crate::locate::DataBlock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TranscribeStats {
    pub rows: u32,
    pub written: u32,
    /// Empty raw cells that fell on hidden merge members
    pub skipped: u32,
}

/// Rows both blocks can hold: raw rows beyond the layout block are dropped,
/// layout rows beyond the raw block keep their layout content.
pub fn row_count(raw: &DataBlock, template: &DataBlock) -> u32 {
    raw.len().min(template.len())
}

/// Copy `row_count` rows of values column by column.
///
/// Every write goes through the anchor index of the template. An empty raw
/// value aimed at a hidden merge member is skipped; otherwise it would
/// clear the anchor's content.
pub fn transcribe<R, T>(
    raw: &R,
    raw_start: u32,
    template: &mut T,
    template_start: u32,
    row_count: u32,
    columns: RangeInclusive<u32>,
    anchors: &MergeAnchorIndex,
) -> TranscribeStats
where
    R: Grid + ?Sized,
    T: Grid + ?Sized,
{
    let mut stats = TranscribeStats {
        rows: row_count,
        ..Default::default()
    };

    for offset in 0..row_count {
        let (raw_row, row) = (raw_start + offset, template_start + offset);
        for col in columns.clone() {
            let value = raw.value(raw_row, col);
            if value.is_empty() && anchors.is_hidden(row, col) {
                stats.skipped += 1;
                continue;
            }
            anchors.write(template, row, col, value);
            stats.written += 1;
        }
    }
    stats
}
