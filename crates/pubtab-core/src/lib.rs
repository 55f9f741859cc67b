//! # pubtab-core
//!
//! Core data model and traits for the pubtab transcription engine.
//!
//! This crate provides:
//! - Sheet model: `Sheet`, `CellValue`, `CellStyle`, `MergeRange`
//! - The `Grid` trait every worksheet backend implements
//! - `MergeAnchorIndex` for merge-safe reads and writes
//! - Reporting periods: `Granularity`, `PeriodToken`, `Period`
//! - The `TableSpec` registry for table kinds 1, 2, 3 and 5
//! - `Settings` and `Vocabulary` configuration values
//! - Error types and the `ProgressLog` capability
//!
//! ## Example
//!
//! ```rust
//! use pubtab_core::{CellValue, Grid, MergeAnchorIndex, MergeRange, Sheet};
//!
//! let mut sheet = Sheet::new("Tabelle 1");
//! sheet.merge(MergeRange::new(1, 1, 1, 4));
//!
//! let index = MergeAnchorIndex::build(&sheet);
//! index.write(&mut sheet, 1, 3, CellValue::from("Employees by sector"));
//!
//! assert_eq!(sheet.value(1, 1), CellValue::from("Employees by sector"));
//! assert_eq!(sheet.value(1, 3), CellValue::Empty);
//! ```

pub mod merge;
pub mod period;
pub mod settings;
pub mod sheet;
pub mod table;
pub mod vocab;
pub mod workbook;

pub use merge::MergeAnchorIndex;
pub use period::{Granularity, Period, PeriodToken};
pub use settings::{Language, Settings, TableOverride};
pub use sheet::{
    parse_number, Cell, CellStyle, CellValue, DisplayFormat, Grid, HorizontalAlign, MergeRange,
    Sheet,
};
pub use table::{DataStartRule, TableKind, TableSpec, Variant};
pub use vocab::Vocabulary;
pub use workbook::{RawWorkbook, StyledBook, WorkbookStore};

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Logging capability
// ============================================================================

/// Progress and error reporting seam.
///
/// The engine never decides where messages end up; the caller supplies a
/// sink (tracing, a protocol file, a GUI list, a test buffer).
pub trait ProgressLog {
    fn log(&self, message: &str);
}

impl<F> ProgressLog for F
where
    F: Fn(&str),
{
    fn log(&self, message: &str) {
        self(message);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Transcription error
///
/// Heuristic misses (no period, no data block, no footer) are not errors;
/// detectors return `Option` and the engine omits the field.
#[derive(Debug, Error)]
pub enum PubtabError {
    #[error("Layout template missing for table {kind} ({variant}): {}", path.display())]
    TemplateMissing {
        kind: TableKind,
        variant: Variant,
        path: PathBuf,
    },

    #[error("Unrecognized input file: {0}")]
    UnknownInput(String),

    #[error("Sheet '{sheet}' not found in {}", path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Workbook error in {}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PubtabError {
    /// Whether the error stems from configuration (missing layouts, bad
    /// settings) rather than from reading or writing a workbook.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PubtabError::TemplateMissing { .. } | PubtabError::Config(_)
        )
    }
}

pub type Result<T, E = PubtabError> = std::result::Result<T, E>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn closures_are_progress_logs() {
        let lines = RefCell::new(Vec::new());
        let sink = |m: &str| lines.borrow_mut().push(m.to_string());
        sink.log("[T1] INTERN -> out.xlsx");
        assert_eq!(lines.borrow().as_slice(), ["[T1] INTERN -> out.xlsx"]);
    }

    #[test]
    fn template_missing_is_configuration() {
        let err = PubtabError::TemplateMissing {
            kind: TableKind::One,
            variant: Variant::External,
            path: PathBuf::from("Layouts/Tabelle-1-Layout_g.xlsx"),
        };
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Layout template missing for table 1 (external): Layouts/Tabelle-1-Layout_g.xlsx"
        );

        let io = PubtabError::from(std::io::Error::other("disk full"));
        assert!(!io.is_configuration());
    }
}
