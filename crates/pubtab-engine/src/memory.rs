//! In-memory workbook store
//!
//! Holds workbooks as lists of [`Sheet`]s keyed by path. Used by tests and
//! dry runs; nothing touches the file system.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pubtab_core::{Grid, PubtabError, RawWorkbook, Sheet, StyledBook, WorkbookStore};

/// Styled book backed by in-memory sheets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryBook {
    pub sheets: Vec<Sheet>,
}

impl StyledBook for MemoryBook {
    type Sheet<'a> = &'a mut Sheet;

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name().to_string()).collect()
    }

    fn sheet_mut(&mut self, index: usize) -> Option<Self::Sheet<'_>> {
        self.sheets.get_mut(index)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<BTreeMap<PathBuf, Vec<Sheet>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, sheets: Vec<Sheet>) {
        self.files.borrow_mut().insert(path.into(), sheets);
    }

    pub fn get(&self, path: &Path) -> Option<Vec<Sheet>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }

    fn load(&self, path: &Path) -> Result<Vec<Sheet>, PubtabError> {
        self.get(path).ok_or_else(|| PubtabError::Workbook {
            path: path.to_path_buf(),
            message: "no such workbook".into(),
        })
    }
}

impl WorkbookStore for MemoryStore {
    type Book = MemoryBook;

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn open_raw(&self, path: &Path) -> Result<RawWorkbook, PubtabError> {
        self.load(path).map(RawWorkbook::new)
    }

    fn open_styled(&self, path: &Path) -> Result<MemoryBook, PubtabError> {
        self.load(path).map(|sheets| MemoryBook { sheets })
    }

    fn save(&self, book: &MemoryBook, path: &Path) -> Result<(), PubtabError> {
        self.insert(path, book.sheets.clone());
        Ok(())
    }
}
