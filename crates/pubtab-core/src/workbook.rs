//! Workbook seams
//!
//! Raw input is always read as a cached-value snapshot (`RawWorkbook`);
//! templates and the annual raw copy are opened as styled books that are
//! edited in place and saved. `WorkbookStore` is implemented by the xlsx
//! backend and by an in-memory store for tests.

use std::path::Path;

use crate::sheet::{Grid, Sheet};
use crate::PubtabError;

/// Read-only, cached-value view of a raw workbook
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawWorkbook {
    pub sheets: Vec<Sheet>,
}

impl RawWorkbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_named(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    /// The named sheet, or the first sheet when the name is absent.
    pub fn primary(&self, name: &str) -> Option<&Sheet> {
        self.sheet_named(name).or_else(|| self.sheets.first())
    }
}

/// A workbook whose sheets can be edited with styles preserved
pub trait StyledBook {
    type Sheet<'a>: Grid
    where
        Self: 'a;

    fn sheet_names(&self) -> Vec<String>;

    fn sheet_mut(&mut self, index: usize) -> Option<Self::Sheet<'_>>;

    fn sheet_count(&self) -> usize {
        self.sheet_names().len()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sheet_names().iter().position(|n| n == name)
    }
}

/// Loads and persists workbooks
pub trait WorkbookStore {
    type Book: StyledBook;

    fn exists(&self, path: &Path) -> bool;

    /// Open a raw workbook read-only, resolving formulas to cached values.
    fn open_raw(&self, path: &Path) -> Result<RawWorkbook, PubtabError>;

    /// Open a workbook for editing (layout templates, annual raw copies).
    fn open_styled(&self, path: &Path) -> Result<Self::Book, PubtabError>;

    fn save(&self, book: &Self::Book, path: &Path) -> Result<(), PubtabError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_falls_back_to_first_sheet() {
        let raw = RawWorkbook::new(vec![Sheet::new("Daten"), Sheet::new("Tabelle 1")]);
        assert_eq!(raw.primary("Tabelle 1").map(|s| s.name()), Some("Tabelle 1"));
        assert_eq!(raw.primary("Tabelle 9").map(|s| s.name()), Some("Daten"));
        assert!(RawWorkbook::default().primary("Tabelle 1").is_none());
    }
}
