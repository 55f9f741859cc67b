//! Domain vocabulary used by the heuristics
//!
//! The detectors look for words (month names, "Total", the copyright sign,
//! the as-of label). The words depend on the publication language, so
//! they live in one configurable value instead of being scattered as
//! literals.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Month names, January first
    pub months: Vec<String>,
    pub quarter: String,
    pub half_year: String,
    /// Word placed before a bare year ("Year 2025")
    pub year: String,
    /// Label of the first data row ("Total")
    pub total: String,
    /// Leading character of footnote lines
    pub footnote_marker: String,
    pub copyright_marker: String,
    /// As-of label without colon ("As of")
    pub as_of: String,
    pub internal_banner: String,
    /// Thousands separator used in integer number formats
    pub group_separator: String,
    /// Strings meaning "no data" / "not applicable"
    pub sentinels: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::english()
    }
}

impl Vocabulary {
    pub fn english() -> Self {
        Self {
            months: [
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]
            .map(String::from)
            .to_vec(),
            quarter: "Quarter".into(),
            half_year: "Half-year".into(),
            year: "Year".into(),
            total: "Total".into(),
            footnote_marker: "-".into(),
            copyright_marker: "©".into(),
            as_of: "As of".into(),
            internal_banner: "For internal use only".into(),
            group_separator: " ".into(),
            sentinels: vec!["-".into(), "X".into()],
        }
    }

    pub fn german() -> Self {
        Self {
            months: [
                "Januar",
                "Februar",
                "März",
                "April",
                "Mai",
                "Juni",
                "Juli",
                "August",
                "September",
                "Oktober",
                "November",
                "Dezember",
            ]
            .map(String::from)
            .to_vec(),
            quarter: "Quartal".into(),
            half_year: "Halbjahr".into(),
            year: "Jahr".into(),
            total: "Insgesamt".into(),
            as_of: "Stand".into(),
            internal_banner: "NUR FÜR DEN INTERNEN GEBRAUCH".into(),
            ..Self::english()
        }
    }

    /// "Year 2025"
    pub fn year_label(&self, year: &str) -> String {
        format!("{} {}", self.year, year)
    }

    /// "As of: 15.01.2026"
    pub fn stamp(&self, text: &str) -> String {
        format!("{}: {}", self.as_of, text)
    }

    pub fn is_stamp(&self, text: &str) -> bool {
        text.trim_start().starts_with(&self.as_of)
    }

    pub fn is_sentinel(&self, text: &str) -> bool {
        let t = text.trim();
        self.sentinels.iter().any(|s| s == t)
    }

    pub fn is_copyright(&self, text: &str) -> bool {
        text.contains(&self.copyright_marker)
    }

    pub fn is_footnote(&self, text: &str) -> bool {
        text.trim_start().starts_with(&self.footnote_marker)
    }
}
