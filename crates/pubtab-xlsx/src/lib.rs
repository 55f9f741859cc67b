//! # pubtab-xlsx
//!
//! File-system workbook store for the pubtab engine.
//!
//! - Raw inputs are read with calamine as cached-value snapshots
//!   ([`raw::read_raw`]).
//! - Layout templates and annual raw copies are edited with
//!   umya-spreadsheet so their styling survives ([`styled::XlsxBook`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pubtab_core::Settings;
//! use pubtab_engine::{Assembler, TracingLog};
//! use pubtab_xlsx::XlsxStore;
//!
//! let settings = Settings::default();
//! let store = XlsxStore::new().with_group_separator(settings.vocabulary().group_separator);
//! let assembler = Assembler::new(settings, &store, &TracingLog);
//! let outcome = assembler.process_file(
//!     Path::new("input/2025-12/Tabelle-1-Land_2025-12.xlsx"),
//!     Path::new("output"),
//! )?;
//! # Ok::<(), pubtab_core::PubtabError>(())
//! ```

pub mod raw;
pub mod styled;

pub use raw::read_raw;
pub use styled::{XlsxBook, XlsxSheet};

use std::path::Path;

use pubtab_core::{PubtabError, RawWorkbook, WorkbookStore};

/// Workbook store over `.xlsx` files on disk
#[derive(Clone, Debug)]
pub struct XlsxStore {
    group_separator: String,
}

impl Default for XlsxStore {
    fn default() -> Self {
        Self {
            group_separator: " ".to_string(),
        }
    }
}

impl XlsxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thousands separator used in integer number formats.
    pub fn with_group_separator(mut self, separator: impl Into<String>) -> Self {
        self.group_separator = separator.into();
        self
    }
}

impl WorkbookStore for XlsxStore {
    type Book = XlsxBook;

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open_raw(&self, path: &Path) -> Result<RawWorkbook, PubtabError> {
        read_raw(path)
    }

    fn open_styled(&self, path: &Path) -> Result<XlsxBook, PubtabError> {
        XlsxBook::open(path, self.group_separator.as_str())
    }

    fn save(&self, book: &XlsxBook, path: &Path) -> Result<(), PubtabError> {
        book.save(path)?;
        tracing::debug!(path = %path.display(), "workbook saved");
        Ok(())
    }
}
