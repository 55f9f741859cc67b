//! # pubtab-engine
//!
//! Layout-mapping transcription for statistical publication tables.
//!
//! Given a raw workbook and a layout template, the engine finds the
//! reporting period and the data block in both, copies the values across
//! through merge-safe writes, formats numbers, normalizes the footer and
//! (for public outputs) highlights flagged rows.
//!
//! ## Modules
//!
//! - [`period`]: period label resolution
//! - [`locate`]: data block and footer detection, kind 5 region blocks
//! - [`transcribe`]: row-by-row value transfer
//! - [`format`]: integer and percent display rules
//! - [`footer`]: copyright year and as-of stamp
//! - [`highlight`]: review-row fills
//! - [`assemble`]: the per-file state machine
//! - [`batch`]: discovery, batch runs and reports
//! - [`memory`]: in-memory workbook store
//!
//! ## Example
//!
//! ```rust
//! use pubtab_core::{CellValue, DisplayFormat, Vocabulary};
//! use pubtab_engine::format::display_text;
//!
//! let vocab = Vocabulary::english();
//! let shown = display_text(&CellValue::Number(-1234.0), DisplayFormat::IntegerGrouped, &vocab);
//! assert_eq!(shown, "- 1 234");
//! ```

pub mod assemble;
pub mod batch;
pub mod footer;
pub mod format;
pub mod highlight;
pub mod locate;
pub mod memory;
pub mod period;
pub mod transcribe;

pub use assemble::{Assembler, BlockSummary, InputName, Stage};
pub use batch::{discover_inputs, BatchReport, FileOutcome, FileReport, Job, SkippedJob};
pub use footer::{normalize_footer, FooterOutcome};
pub use format::{display_text, format_numbers};
pub use highlight::highlight_rows;
pub use locate::{find_footer_start, locate_block, locate_region_blocks, DataBlock, RegionBlock};
pub use memory::{MemoryBook, MemoryStore};
pub use period::{resolve_period, PeriodScan, ResolvedPeriod};
pub use transcribe::transcribe;

use pubtab_core::ProgressLog;

/// `ProgressLog` that forwards every message to `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl ProgressLog for TracingLog {
    fn log(&self, message: &str) {
        tracing::info!(target: "pubtab", "{message}");
    }
}
