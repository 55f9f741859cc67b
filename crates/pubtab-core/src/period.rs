//! Reporting periods
//!
//! Two sources describe the period of a raw file:
//! - the file name carries a machine token (`2025-03`, `2025-Q1`,
//!   `2025-H2`, `2025-JJ`) that decides granularity and the annual case
//! - the sheet header carries the human label that ends up in the outputs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Reporting granularity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    Month,
    Quarter,
    HalfYear,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::HalfYear => "half-year",
            Granularity::Year => "year",
        }
    }

    /// Batch order: month, quarter, half-year, year.
    pub fn all() -> [Granularity; 4] {
        [
            Granularity::Month,
            Granularity::Quarter,
            Granularity::HalfYear,
            Granularity::Year,
        ]
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Period token encoded in an input file name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodToken {
    pub year: u16,
    pub granularity: Granularity,
    /// Month (1-12), quarter (1-4) or half (1-2); `None` for years
    pub index: Option<u8>,
}

const TOKEN_BODY: &str = r"\d{4}-(?:\d{2}|Q\d|H\d|JJ)";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})(?:-(?:(\d{2})|Q([1-4])|H([12])|(JJ)))?$").expect("static pattern")
    })
}

fn file_name_patterns() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(&format!("_({TOKEN_BODY})$")).expect("static pattern"),
            Regex::new(&format!("_({TOKEN_BODY})_")).expect("static pattern"),
            Regex::new(r"(20\d{2}-(?:\d{2}|Q\d|H\d|JJ))").expect("static pattern"),
        ]
    })
}

impl PeriodToken {
    /// Parse a bare token: `YYYY-MM`, `YYYY-Q<1-4>`, `YYYY-H<1-2>`, `YYYY-JJ` or `YYYY`.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = token_regex().captures(token.trim())?;
        let year = caps.get(1)?.as_str().parse().ok()?;

        if let Some(month) = caps.get(2) {
            let month: u8 = month.as_str().parse().ok()?;
            return (1..=12).contains(&month).then_some(Self {
                year,
                granularity: Granularity::Month,
                index: Some(month),
            });
        }
        if let Some(q) = caps.get(3) {
            return Some(Self {
                year,
                granularity: Granularity::Quarter,
                index: q.as_str().parse().ok(),
            });
        }
        if let Some(h) = caps.get(4) {
            return Some(Self {
                year,
                granularity: Granularity::HalfYear,
                index: h.as_str().parse().ok(),
            });
        }
        Some(Self {
            year,
            granularity: Granularity::Year,
            index: None,
        })
    }

    /// Find the token in a file name such as `Tabelle-1-Land_2025-Q3.xlsx`.
    ///
    /// A trailing `_<token>` wins over an embedded `_<token>_`, which wins
    /// over any `20YY-…` fragment.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name
            .rsplit_once('.')
            .map_or(name, |(stem, _)| stem);
        file_name_patterns()
            .iter()
            .find_map(|re| re.captures(stem))
            .and_then(|caps| Self::parse(caps.get(1)?.as_str()))
    }

    pub fn is_annual(&self) -> bool {
        self.granularity == Granularity::Year
    }
}

impl fmt::Display for PeriodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.granularity, self.index) {
            (Granularity::Month, Some(m)) => write!(f, "{}-{:02}", self.year, m),
            (Granularity::Quarter, Some(q)) => write!(f, "{}-Q{}", self.year, q),
            (Granularity::HalfYear, Some(h)) => write!(f, "{}-H{}", self.year, h),
            _ => write!(f, "{}-JJ", self.year),
        }
    }
}

/// A period label resolved from a sheet header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub granularity: Granularity,
    /// Rendered label, e.g. "December 2025" or "Year 2025"
    pub label: String,
}
