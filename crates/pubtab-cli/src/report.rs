//! Report rendering for CLI output
//!
//! Batch reports and inspections are printed to stdout, either as plain
//! text or as JSON. Progress messages go through tracing to stderr (and
//! the protocol file), so stdout stays machine-readable.
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Every discovered file was written or skipped |
//! | 1 | At least one file failed, or the run could not start |

use std::fmt::Write as _;
use std::path::PathBuf;

use pubtab_engine::{BatchReport, DataBlock, FileOutcome, ResolvedPeriod};
use serde::Serialize;

// ============================================================================
// Exit Code
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    pub fn from_report(report: &BatchReport) -> Self {
        if report.has_failures() {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

// ============================================================================
// Batch report
// ============================================================================

pub fn batch_text(report: &BatchReport) -> String {
    let mut out = String::new();
    for job in &report.skipped_jobs {
        let _ = writeln!(
            out,
            "job {} skipped: {}: {}",
            job.job,
            job.input_dir.display(),
            job.reason
        );
    }
    for file in &report.files {
        let input = file.input.display();
        let _ = match &file.outcome {
            FileOutcome::Written { internal, external } => writeln!(
                out,
                "written  {input}\n         -> {}\n         -> {}",
                internal.display(),
                external.display()
            ),
            FileOutcome::Skipped { reason } => writeln!(out, "skipped  {input}: {reason}"),
            FileOutcome::Failed { error, .. } => writeln!(out, "FAILED   {input}: {error}"),
        };
    }
    out.push_str(&report.summary());
    out.push('\n');
    out
}

pub fn batch_json(report: &BatchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// ============================================================================
// Inspection
// ============================================================================

/// What the engine detects in a raw file, without writing anything
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub file: PathBuf,
    pub table: u8,
    pub token: Option<String>,
    pub annual: bool,
    pub sheet: String,
    pub period: Option<ResolvedPeriod>,
    pub blocks: Vec<BlockBounds>,
    pub footer_start_row: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockBounds {
    pub region: Option<String>,
    pub first_data_row: Option<u32>,
    pub footer_start_row: u32,
    pub rows: u32,
}

impl BlockBounds {
    pub fn new(region: Option<String>, block: DataBlock) -> Self {
        Self {
            region,
            first_data_row: block.first_data_row,
            footer_start_row: block.footer_start_row,
            rows: block.len(),
        }
    }
}

pub fn inspection_text(inspection: &Inspection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "file:    {}", inspection.file.display());
    let _ = writeln!(out, "table:   {}", inspection.table);
    let _ = writeln!(
        out,
        "token:   {}{}",
        inspection.token.as_deref().unwrap_or("-"),
        if inspection.annual { " (annual)" } else { "" }
    );
    let _ = writeln!(out, "sheet:   {}", inspection.sheet);
    match &inspection.period {
        Some(found) => {
            let _ = writeln!(
                out,
                "period:  {} ({}) at row {}, column {}",
                found.period.label, found.period.granularity, found.row, found.col
            );
        }
        None => out.push_str("period:  not found\n"),
    }
    for block in &inspection.blocks {
        let name = block.region.as_deref().unwrap_or("data");
        match block.first_data_row {
            Some(first) => {
                let _ = writeln!(
                    out,
                    "block:   {name}: rows {first}..{} ({} rows)",
                    block.footer_start_row, block.rows
                );
            }
            None => {
                let _ = writeln!(out, "block:   {name}: no data rows");
            }
        }
    }
    let _ = writeln!(out, "footer:  row {}", inspection.footer_start_row);
    out
}
