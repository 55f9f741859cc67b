//! Batch runs over input folders
//!
//! A batch is an ordered list of jobs, one per (granularity label, input
//! folder). Every relevant file in a folder is processed on its own; a
//! failure is recorded in the report and the batch moves on.

use std::path::{Path, PathBuf};

use pubtab_core::{Granularity, PubtabError, TableKind, Variant, WorkbookStore};
use serde::Serialize;

use crate::assemble::Assembler;

/// One input folder to process
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Job {
    pub label: String,
    pub input_dir: PathBuf,
}

impl Job {
    pub fn new(label: impl Into<String>, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            input_dir: input_dir.into(),
        }
    }

    pub fn for_granularity(granularity: Granularity, input_dir: impl Into<PathBuf>) -> Self {
        Self::new(granularity.as_str(), input_dir)
    }
}

/// Result of processing one raw file
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Written { internal: PathBuf, external: PathBuf },
    Skipped { reason: String },
    Failed { error: String, configuration: bool },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub job: String,
    pub input: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// A job that could not start
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedJob {
    pub job: String,
    pub input_dir: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub skipped_jobs: Vec<SkippedJob>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Written { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Skipped { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.outcome.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} files: {} written, {} skipped, {} failed",
            self.files.len(),
            self.written(),
            self.skipped(),
            self.failures().count()
        )
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Raw inputs are `.xlsx` files with a known table prefix that are not
/// themselves outputs.
pub fn is_relevant_input(file_name: &str) -> bool {
    if !file_name.to_lowercase().ends_with(".xlsx") {
        return false;
    }
    let is_output = [Variant::Internal, Variant::External]
        .iter()
        .any(|v| file_name.ends_with(&format!("{}.xlsx", v.suffix())));
    !is_output && TableKind::from_file_name(file_name).is_some()
}

/// Relevant input files of a folder, sorted by path.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, PubtabError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let relevant = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_relevant_input);
        if relevant && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================================
// Running
// ============================================================================

impl<S: WorkbookStore> Assembler<'_, S> {
    /// Run jobs in order. Outputs of a job go to
    /// `<output_base>/<namespace>/<input folder name>/`.
    pub fn run_batch(&self, jobs: &[Job], output_base: &Path) -> BatchReport {
        let mut report = BatchReport::default();
        for job in jobs {
            self.run_job(job, output_base, &mut report);
        }
        self.log(&report.summary());
        report
    }

    fn skip_job(&self, job: &Job, reason: String, report: &mut BatchReport) {
        self.log(&format!("[SKIP] {}: {reason}", job.input_dir.display()));
        report.skipped_jobs.push(SkippedJob {
            job: job.label.clone(),
            input_dir: job.input_dir.clone(),
            reason,
        });
    }

    fn run_job(&self, job: &Job, output_base: &Path, report: &mut BatchReport) {
        if !job.input_dir.is_dir() {
            self.skip_job(job, "not a valid input directory".into(), report);
            return;
        }

        let folder = job
            .input_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out_dir = output_base.join(&self.settings().namespace).join(folder);
        if let Err(err) = std::fs::create_dir_all(&out_dir) {
            self.skip_job(job, format!("cannot create {}: {err}", out_dir.display()), report);
            return;
        }

        let files = match discover_inputs(&job.input_dir) {
            Ok(files) => files,
            Err(err) => {
                self.skip_job(job, err.to_string(), report);
                return;
            }
        };
        self.log(&format!("--- {} input: {}", job.label, job.input_dir.display()));
        self.log(&format!("--- output: {}", out_dir.display()));
        self.log(&format!("[SCAN] {} relevant files found", files.len()));

        for input in files {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.log(&format!("[START] {name}"));

            let outcome = match self.process_file(&input, &out_dir) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(file = %name, error = %err, "file failed");
                    self.log(&format!("[ERROR] {name}: {err}"));
                    FileOutcome::Failed {
                        error: err.to_string(),
                        configuration: err.is_configuration(),
                    }
                }
            };
            report.files.push(FileReport {
                job: job.label.clone(),
                input,
                outcome,
            });
        }
    }
}
