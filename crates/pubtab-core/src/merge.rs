//! Merge-aware cell addressing
//!
//! Layout templates merge title, banner and footer cells freely. A value
//! written into a non-anchor member of a merge range is silently dropped
//! by spreadsheet applications, so every write is redirected to the
//! anchor. The index is built once per sheet; lookups are O(1).

use std::collections::HashMap;

use crate::sheet::{CellValue, Grid, MergeRange};

/// Maps every merged cell to the anchor (top-left cell) of its range
#[derive(Clone, Debug, Default)]
pub struct MergeAnchorIndex {
    ranges: Vec<MergeRange>,
    members: HashMap<(u32, u32), usize>,
}

impl MergeAnchorIndex {
    /// Index the merge ranges of a sheet.
    pub fn build<G: Grid + ?Sized>(grid: &G) -> Self {
        Self::from_ranges(grid.merges())
    }

    pub fn from_ranges(ranges: Vec<MergeRange>) -> Self {
        let mut members = HashMap::new();
        for (idx, range) in ranges.iter().enumerate() {
            if range.is_single_cell() {
                continue;
            }
            for cell in range.cells() {
                // Overlapping ranges are invalid in xlsx; first one wins.
                members.entry(cell).or_insert(idx);
            }
        }
        Self { ranges, members }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Anchor of the merge range containing `(row, col)`, or the cell itself.
    pub fn resolve(&self, row: u32, col: u32) -> (u32, u32) {
        self.range_at(row, col)
            .map_or((row, col), MergeRange::anchor)
    }

    /// The merge range containing `(row, col)`, if any.
    pub fn range_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        self.members.get(&(row, col)).map(|&idx| &self.ranges[idx])
    }

    /// True when `(row, col)` lies inside a merge range but is not its anchor.
    pub fn is_hidden(&self, row: u32, col: u32) -> bool {
        self.resolve(row, col) != (row, col)
    }

    /// Write through the anchor.
    pub fn write<G: Grid + ?Sized>(&self, grid: &mut G, row: u32, col: u32, value: CellValue) {
        let (r, c) = self.resolve(row, col);
        grid.put_value(r, c, value);
    }

    /// Read through the anchor.
    pub fn read<G: Grid + ?Sized>(&self, grid: &G, row: u32, col: u32) -> CellValue {
        let (r, c) = self.resolve(row, col);
        grid.value(r, c)
    }
}
