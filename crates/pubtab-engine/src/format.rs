//! Number formatting of transcribed data blocks
//!
//! Integer columns are rounded half away from zero and displayed with
//! grouped thousands and a spaced minus ("- 1 234"). The percent column
//! keeps one decimal, shows exact zero as "0" and carries no percent
//! sign. Sentinels ("-", "X") and other text are never touched.

use std::ops::Range;

use pubtab_core::{CellValue, DisplayFormat, Grid, TableSpec, Vocabulary};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatStats {
    pub integers: u32,
    pub percents: u32,
    /// Numeric text cells stored back as numbers
    pub converted: u32,
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// How a value is displayed under a rule; what a reader of the sheet sees.
pub fn display_text(value: &CellValue, format: DisplayFormat, vocab: &Vocabulary) -> String {
    if let CellValue::Text(text) = value {
        if vocab.is_sentinel(text) {
            return text.trim().to_string();
        }
    }
    let Some(n) = value.numeric() else {
        return value.to_plain_string();
    };

    match format {
        DisplayFormat::Plain => value.to_plain_string(),
        DisplayFormat::IntegerGrouped => {
            let rounded = n.round();
            if rounded == 0.0 {
                return "0".to_string();
            }
            let grouped = group_thousands(
                &format!("{}", rounded.abs() as u64),
                &vocab.group_separator,
            );
            if rounded < 0.0 {
                format!("- {grouped}")
            } else {
                grouped
            }
        }
        DisplayFormat::PercentOneDecimal => {
            if n == 0.0 {
                "0".to_string()
            } else {
                format!("{n:.1}")
            }
        }
    }
}

/// Apply the display rules to `rows` of a layout data block.
///
/// Columns run from the first numeric column to `width`; the percent
/// column gets the percent rule, every other column the integer rule.
/// Integer values are stored rounded so the sheet holds what it shows.
pub fn format_numbers<G: Grid + ?Sized>(
    grid: &mut G,
    spec: &TableSpec,
    rows: Range<u32>,
    width: u32,
    vocab: &Vocabulary,
) -> FormatStats {
    let mut stats = FormatStats::default();
    for row in rows {
        for col in spec.data_start.numeric_from()..=width {
            let value = grid.value(row, col);
            if let CellValue::Text(text) = &value {
                if vocab.is_sentinel(text) {
                    continue;
                }
            }
            let Some(n) = value.numeric() else {
                continue;
            };

            if col == spec.percent_col {
                if matches!(value, CellValue::Text(_)) {
                    grid.put_value(row, col, CellValue::Number(n));
                    stats.converted += 1;
                }
                grid.set_display(row, col, DisplayFormat::PercentOneDecimal);
                stats.percents += 1;
            } else {
                // -0.4 rounds to -0.0; store a plain zero
                let rounded = n.round() + 0.0;
                if matches!(value, CellValue::Text(_)) {
                    stats.converted += 1;
                }
                if value != CellValue::Number(rounded) {
                    grid.put_value(row, col, CellValue::Number(rounded));
                }
                grid.set_display(row, col, DisplayFormat::IntegerGrouped);
                stats.integers += 1;
            }
        }
    }
    stats
}
