//! Run configuration
//!
//! Everything the engine needs besides the files themselves: where the
//! layouts live, which vocabulary to match, per-table overrides of the
//! built-in registry. Passed explicitly to the assembler; nothing is
//! read from globals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::table::{TableKind, TableSpec, Variant};
use crate::vocab::Vocabulary;
use crate::PubtabError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
}

/// Per-table overrides of the built-in `TableSpec` registry
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOverride {
    pub raw_sheet: Option<String>,
    pub percent_col: Option<u32>,
    pub marker_col: Option<u32>,
    pub period_row_internal: Option<u32>,
    pub period_row_external: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub layout_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
    /// Publication namespace directory below the output base
    pub namespace: String,
    pub overwrite: bool,
    /// ARGB fill for rows flagged in the marker column
    pub highlight_color: String,
    pub period_scan_rows: u32,
    pub period_scan_cols: u32,
    /// Rows above the copyright line searched for the right-most data column
    pub footer_window: u32,
    pub language: Language,
    /// Replaces the language preset entirely when given
    pub vocabulary: Option<Vocabulary>,
    /// Keyed by table number ("1", "2", "3", "5")
    pub tables: BTreeMap<String, TableOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout_dir: PathBuf::from("Layouts"),
            log_dir: None,
            namespace: "VÖ-Tabellen".into(),
            overwrite: true,
            highlight_color: "FFFFFF99".into(),
            period_scan_rows: 40,
            period_scan_cols: 3,
            footer_window: 30,
            language: Language::En,
            vocabulary: None,
            tables: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, PubtabError> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| PubtabError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, PubtabError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), PubtabError> {
        for (key, over) in &self.tables {
            let kind = key
                .parse::<u8>()
                .ok()
                .and_then(TableKind::from_number)
                .ok_or_else(|| PubtabError::Config(format!("unknown table '{key}'")))?;
            let spec = self.table_spec(kind, Variant::External);
            if over.percent_col.is_some() && spec.percent_col < spec.data_start.numeric_from() {
                return Err(PubtabError::Config(format!(
                    "table {key}: percent column {} lies left of the numeric columns",
                    spec.percent_col
                )));
            }
        }
        if self.highlight_color.len() != 8
            || !self.highlight_color.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(PubtabError::Config(format!(
                "highlight_color must be 8 hex digits (ARGB), got '{}'",
                self.highlight_color
            )));
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary.clone().unwrap_or_else(|| match self.language {
            Language::En => Vocabulary::english(),
            Language::De => Vocabulary::german(),
        })
    }

    /// Registry spec with this configuration's overrides applied.
    pub fn table_spec(&self, kind: TableKind, variant: Variant) -> TableSpec {
        let mut spec = TableSpec::lookup(kind, variant);
        if let Some(over) = self.tables.get(&kind.number().to_string()) {
            if let Some(sheet) = &over.raw_sheet {
                spec.raw_sheet.clone_from(sheet);
            }
            if let Some(col) = over.percent_col {
                spec.percent_col = col;
            }
            if over.marker_col.is_some() {
                spec.marker_col = over.marker_col;
            }
            let row = match variant {
                Variant::Internal => over.period_row_internal,
                Variant::External => over.period_row_external,
            };
            if let Some(row) = row {
                spec.period_row = row;
            }
        }
        spec
    }

    pub fn template_path(&self, kind: TableKind, variant: Variant) -> PathBuf {
        self.layout_dir.join(kind.template_file(variant))
    }
}
