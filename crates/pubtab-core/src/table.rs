//! Table kinds and their structural descriptors
//!
//! Each `(TableKind, Variant)` pair has a fixed `TableSpec`: where the raw
//! data lives, which column holds percentages, where the period label
//! goes. The engine is generic over this descriptor instead of branching
//! on the kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four supported table kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableKind {
    One,
    Two,
    Three,
    Five,
}

impl TableKind {
    pub fn all() -> [TableKind; 4] {
        [TableKind::One, TableKind::Two, TableKind::Three, TableKind::Five]
    }

    pub fn number(&self) -> u8 {
        match self {
            TableKind::One => 1,
            TableKind::Two => 2,
            TableKind::Three => 3,
            TableKind::Five => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::all().into_iter().find(|k| k.number() == n)
    }

    /// Input file prefix, e.g. `Tabelle-1-Land`
    pub fn file_prefix(&self) -> String {
        format!("Tabelle-{}-Land", self.number())
    }

    /// Default name of the data sheet in a raw workbook
    pub fn raw_sheet_name(&self) -> String {
        format!("Tabelle {}", self.number())
    }

    /// Layout template file name for a variant
    pub fn template_file(&self, variant: Variant) -> String {
        format!("Tabelle-{}-Layout{}.xlsx", self.number(), variant.suffix())
    }

    /// Detect the kind from an input file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|k| name.starts_with(&k.file_prefix()))
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Output variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Pre-publication copy with an internal-use banner
    Internal,
    /// Public copy
    External,
}

impl Variant {
    /// File name suffix: `_INTERN` or `_g`
    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Internal => "_INTERN",
            Variant::External => "_g",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Internal => "internal",
            Variant::External => "external",
        })
    }
}

/// How the first data row is found
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataStartRule {
    /// First row whose label columns hold the total label; fallback: first
    /// row with a numeric-like cell at or right of `numeric_from`.
    TotalLabel { label_cols: u32, numeric_from: u32 },
    /// Repeating region headings ("<Region> <n>)") in `label_col` split the
    /// sheet into sub-blocks, each located like `TotalLabel`.
    RegionBlocks { label_col: u32, numeric_from: u32 },
}

impl DataStartRule {
    pub fn numeric_from(&self) -> u32 {
        match *self {
            DataStartRule::TotalLabel { numeric_from, .. }
            | DataStartRule::RegionBlocks { numeric_from, .. } => numeric_from,
        }
    }

    pub fn label_cols(&self) -> u32 {
        match *self {
            DataStartRule::TotalLabel { label_cols, .. } => label_cols,
            DataStartRule::RegionBlocks { label_col, .. } => label_col,
        }
    }
}

/// Immutable structural facts for one `(kind, variant)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub kind: TableKind,
    pub variant: Variant,
    /// Data sheet in the raw workbook (first sheet when absent)
    pub raw_sheet: String,
    pub percent_col: u32,
    /// Column whose value 1 or 2 flags a row for review
    pub marker_col: Option<u32>,
    /// Row receiving the period label
    pub period_row: u32,
    /// Header rows copied verbatim from raw to template (column A)
    pub title_rows: Vec<u32>,
    /// Optional second title line; when present, the period moves below it
    pub continued_title_row: Option<u32>,
    /// Cell receiving the internal banner (internal variant only)
    pub banner_cell: Option<(u32, u32)>,
    pub data_start: DataStartRule,
    /// Column scanned for footnote markers
    pub footnote_col: u32,
    /// First transcribed column
    pub first_col: u32,
    /// Annual external output is derived from the raw file itself
    pub annual_from_raw: bool,
}

impl TableSpec {
    /// Built-in registry.
    pub fn lookup(kind: TableKind, variant: Variant) -> Self {
        let internal = variant == Variant::Internal;
        let base = TableSpec {
            kind,
            variant,
            raw_sheet: kind.raw_sheet_name(),
            percent_col: 6,
            marker_col: None,
            period_row: if internal { 5 } else { 3 },
            title_rows: vec![1, 2],
            continued_title_row: None,
            banner_cell: internal.then_some((3, 1)),
            data_start: DataStartRule::TotalLabel {
                label_cols: 1,
                numeric_from: 2,
            },
            footnote_col: 1,
            first_col: 1,
            annual_from_raw: false,
        };

        match kind {
            TableKind::One => TableSpec {
                marker_col: Some(7),
                annual_from_raw: !internal,
                ..base
            },
            TableKind::Two => TableSpec {
                percent_col: 8,
                period_row: if internal { 4 } else { 3 },
                continued_title_row: Some(3),
                banner_cell: internal.then_some((5, 1)),
                data_start: DataStartRule::TotalLabel {
                    label_cols: 2,
                    numeric_from: 3,
                },
                first_col: 2,
                ..base
            },
            TableKind::Three => TableSpec {
                percent_col: 8,
                data_start: DataStartRule::TotalLabel {
                    label_cols: 2,
                    numeric_from: 3,
                },
                first_col: 2,
                ..base
            },
            TableKind::Five => TableSpec {
                data_start: DataStartRule::RegionBlocks {
                    label_col: 1,
                    numeric_from: 2,
                },
                ..base
            },
        }
    }

    /// Period row, shifted below a continued title when one is present.
    pub fn period_row_for(&self, has_continued_title: bool) -> u32 {
        match self.continued_title_row {
            Some(row) if has_continued_title && self.period_row <= row => row + 1,
            _ => self.period_row,
        }
    }

    /// Integer-formatted columns up to `width`: every numeric column except
    /// the percent column.
    pub fn integer_cols(&self, width: u32) -> impl Iterator<Item = u32> + '_ {
        (self.data_start.numeric_from()..=width).filter(move |&c| c != self.percent_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_from_file_name() {
        assert_eq!(
            TableKind::from_file_name("Tabelle-5-Land_2025-Q2.xlsx"),
            Some(TableKind::Five)
        );
        assert_eq!(TableKind::from_file_name("Tabelle-4-Land_2025-Q2.xlsx"), None);
        assert_eq!(TableKind::from_number(3), Some(TableKind::Three));
    }

    #[test]
    fn template_file_names() {
        assert_eq!(
            TableKind::One.template_file(Variant::Internal),
            "Tabelle-1-Layout_INTERN.xlsx"
        );
        assert_eq!(
            TableKind::Two.template_file(Variant::External),
            "Tabelle-2-Layout_g.xlsx"
        );
    }

    #[test]
    fn percent_column_never_integer() {
        for kind in TableKind::all() {
            for variant in [Variant::Internal, Variant::External] {
                let spec = TableSpec::lookup(kind, variant);
                let ints: Vec<u32> = spec.integer_cols(20).collect();
                assert!(!ints.contains(&spec.percent_col), "{kind} {variant}");
                assert!(spec.percent_col >= spec.data_start.numeric_from());
            }
        }
    }

    #[test]
    fn only_table_one_external_is_annual_from_raw() {
        for kind in TableKind::all() {
            assert!(!TableSpec::lookup(kind, Variant::Internal).annual_from_raw);
            assert_eq!(
                TableSpec::lookup(kind, Variant::External).annual_from_raw,
                kind == TableKind::One
            );
        }
    }

    #[test]
    fn continued_title_moves_external_period_row() {
        let ext = TableSpec::lookup(TableKind::Two, Variant::External);
        assert_eq!(ext.period_row_for(false), 3);
        assert_eq!(ext.period_row_for(true), 4);

        let int = TableSpec::lookup(TableKind::Two, Variant::Internal);
        assert_eq!(int.period_row_for(true), 4);
        assert_eq!(int.banner_cell, Some((5, 1)));
    }
}
