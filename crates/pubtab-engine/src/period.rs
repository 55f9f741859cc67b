//! Period label resolution
//!
//! Raw sheets state their reporting period somewhere in the header
//! ("December 2025", "3rd Quarter 2025", " 2025"). The resolver scans the
//! top-left corner of the sheet and keeps the **last** candidate found in
//! reading order; titles above the period line may mention months too.

use pubtab_core::{Granularity, Grid, Period, Vocabulary};
use serde::Serialize;

/// Scan window of the resolver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodScan {
    pub rows: u32,
    pub cols: u32,
}

impl Default for PeriodScan {
    fn default() -> Self {
        Self { rows: 40, cols: 3 }
    }
}

/// A period label and the cell it was read from
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedPeriod {
    pub period: Period,
    pub row: u32,
    pub col: u32,
}

fn is_bare_year(text: &str) -> bool {
    text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit())
}

/// True when text begins with a four-digit year ("2025", "2025 revised").
pub fn starts_with_year(text: &str) -> bool {
    let t = text.trim_start();
    t.len() >= 4 && t.as_bytes()[..4].iter().all(u8::is_ascii_digit)
}

/// Case-insensitive match of `word` (which may contain a hyphen, as in
/// "Half-year") not embedded in a longer word.
fn contains_word(text: &str, word: &str) -> bool {
    let text = text.to_lowercase();
    let word = word.to_lowercase();
    if word.is_empty() {
        return false;
    }
    text.match_indices(&word).any(|(idx, _)| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + word.len()..].chars().next();
        !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
    })
}

/// Classify a header text as a period candidate.
///
/// Footnotes, copyright lines and as-of stamps never qualify, even when
/// they mention a month.
pub fn classify(text: &str, vocab: &Vocabulary) -> Option<Period> {
    let t = text.trim();
    if t.is_empty() || vocab.is_footnote(t) || vocab.is_copyright(t) || vocab.is_stamp(t) {
        return None;
    }

    if is_bare_year(t) {
        return Some(Period {
            granularity: Granularity::Year,
            label: vocab.year_label(t),
        });
    }

    let granularity = if contains_word(t, &vocab.quarter) {
        Granularity::Quarter
    } else if contains_word(t, &vocab.half_year) {
        Granularity::HalfYear
    } else if vocab.months.iter().any(|m| contains_word(t, m)) {
        Granularity::Month
    } else if t
        .strip_prefix(vocab.year.as_str())
        .is_some_and(|rest| is_bare_year(rest.trim()))
    {
        // Already rendered ("Year 2025"); keeps re-runs stable.
        Granularity::Year
    } else {
        return None;
    };

    Some(Period {
        granularity,
        label: t.to_string(),
    })
}

/// Resolve the reporting period from the header of a raw sheet.
///
/// Returns `None` when no candidate exists; callers omit the field.
pub fn resolve_period<G: Grid + ?Sized>(
    grid: &G,
    vocab: &Vocabulary,
    scan: PeriodScan,
) -> Option<ResolvedPeriod> {
    let rows = scan.rows.min(grid.max_row());
    let cols = scan.cols.min(grid.max_col());

    let mut found = None;
    for row in 1..=rows {
        for col in 1..=cols {
            let Some(text) = grid.text(row, col) else {
                continue;
            };
            if let Some(period) = classify(&text, vocab) {
                tracing::trace!(row, col, label = %period.label, "period candidate");
                found = Some(ResolvedPeriod { period, row, col });
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pubtab_core::{CellValue, Sheet};

    fn en() -> Vocabulary {
        Vocabulary::english()
    }

    #[test]
    fn bare_year_is_rendered() {
        let p = classify(" 2025", &en()).unwrap();
        assert_eq!(p.granularity, Granularity::Year);
        assert_eq!(p.label, "Year 2025");
    }

    #[test]
    fn labels_are_verbatim() {
        assert_eq!(classify("December 2025", &en()).unwrap().label, "December 2025");
        assert_eq!(
            classify("3rd Quarter 2025", &en()).unwrap().granularity,
            Granularity::Quarter
        );
        assert_eq!(
            classify("1st Half-year 2025", &en()).unwrap().granularity,
            Granularity::HalfYear
        );
        assert_eq!(classify("Year 2024", &en()).unwrap().label, "Year 2024");
    }

    #[test]
    fn non_candidates() {
        assert_eq!(classify("Employees by sector", &en()), None);
        assert_eq!(classify("Mayor's office", &en()), None);
        assert_eq!(classify("As of: 15 January 2026", &en()), None);
        assert_eq!(classify("© Statistical Office, March 2025", &en()), None);
        assert_eq!(classify("- January figures provisional", &en()), None);
        assert_eq!(classify("20251", &en()), None);
    }

    #[test]
    fn period_words_must_stand_alone() {
        assert_eq!(classify("Employees at headquarters", &en()), None);
        assert_eq!(classify("Quarterly bulletin", &en()), None);
        assert_eq!(classify("Halfyearly figures", &en()), None);
        assert_eq!(
            classify("QUARTER 4 2025", &en()).unwrap().granularity,
            Granularity::Quarter
        );
        let de = Vocabulary::german();
        assert_eq!(classify("Quartalsbericht", &de), None);
        assert_eq!(
            classify("1. Halbjahr 2025", &de).unwrap().granularity,
            Granularity::HalfYear
        );
    }

    #[test]
    fn german_vocabulary() {
        let de = Vocabulary::german();
        assert_eq!(classify("März 2025", &de).unwrap().granularity, Granularity::Month);
        assert_eq!(classify("2. Quartal 2025", &de).unwrap().granularity, Granularity::Quarter);
        assert_eq!(classify("2025", &de).unwrap().label, "Jahr 2025");
    }

    #[test]
    fn last_candidate_wins() {
        let mut sheet = Sheet::new("Tabelle 1");
        sheet
            .set(1, 1, "Employment in January by region")
            .set(2, 1, "Employees subject to social insurance")
            .set(3, 1, "December 2025")
            .set(8, 1, "Total")
            .set(8, 2, 1234.0);

        let resolved = resolve_period(&sheet, &en(), PeriodScan::default()).unwrap();
        assert_eq!(resolved.period.label, "December 2025");
        assert_eq!((resolved.row, resolved.col), (3, 1));
    }

    #[test]
    fn scan_window_is_bounded() {
        let mut sheet = Sheet::new("t");
        sheet
            .set(2, 1, "May 2025")
            .set(50, 1, "June 2025")
            .set(3, 5, "July 2025");
        let scan = PeriodScan { rows: 40, cols: 3 };
        let resolved = resolve_period(&sheet, &en(), scan).unwrap();
        assert_eq!(resolved.period.label, "May 2025");
    }

    #[test]
    fn numbers_are_not_years() {
        let mut sheet = Sheet::new("t");
        sheet.set(3, 1, CellValue::Number(2025.0));
        assert_eq!(resolve_period(&sheet, &en(), PeriodScan::default()), None);
    }
}
